//! Job Queries

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    pub job_id: String,
}

/// 获取旁白任务产物
#[derive(Debug, Clone)]
pub struct GetJobResult {
    pub job_id: String,
}
