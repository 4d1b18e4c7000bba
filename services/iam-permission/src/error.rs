use cuba_errors::AppError;
use thiserror::Error;

/// 权限操作的失败结果
///
/// 调用方可纠正的情况都以返回值表达，不会 panic。基础设施错误包装在 `Store` 中。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Permission name is required.")]
    InvalidPermissionName,
    #[error("Permission group name is required.")]
    InvalidGroupName,
    #[error("Permission '{0}' already exists.")]
    DuplicateName(String),
    #[error("Permission group '{0}' already exists.")]
    DuplicateGroupName(String),
    #[error("Role not found.")]
    RoleNotFound,
    #[error("User not found.")]
    UserNotFound,
    #[error("Permission not found.")]
    PermissionNotFound,
    #[error("Permission group not found.")]
    PermissionGroupNotFound,
    #[error("Permission group '{0}' still contains permissions.")]
    GroupInUse(String),
    #[error(transparent)]
    Store(#[from] AppError),
}

impl PermissionError {
    /// 机器可读的错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPermissionName => "InvalidPermissionName",
            Self::InvalidGroupName => "InvalidGroupName",
            Self::DuplicateName(_) => "DuplicateName",
            Self::DuplicateGroupName(_) => "DuplicateGroupName",
            Self::RoleNotFound => "RoleNotFound",
            Self::UserNotFound => "UserNotFound",
            Self::PermissionNotFound => "PermissionNotFound",
            Self::PermissionGroupNotFound => "PermissionGroupNotFound",
            Self::GroupInUse(_) => "GroupInUse",
            Self::Store(e) => e.code(),
        }
    }

    /// 人类可读的描述
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<PermissionError> for AppError {
    fn from(error: PermissionError) -> Self {
        match error {
            PermissionError::InvalidPermissionName | PermissionError::InvalidGroupName => {
                AppError::Validation(error.to_string())
            }
            PermissionError::DuplicateName(_)
            | PermissionError::DuplicateGroupName(_)
            | PermissionError::GroupInUse(_) => AppError::Conflict(error.to_string()),
            PermissionError::RoleNotFound
            | PermissionError::UserNotFound
            | PermissionError::PermissionNotFound
            | PermissionError::PermissionGroupNotFound => AppError::NotFound(error.to_string()),
            PermissionError::Store(e) => e,
        }
    }
}

pub type PermissionResult<T> = Result<T, PermissionError>;
