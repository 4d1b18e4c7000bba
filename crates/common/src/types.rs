//! 通用类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 定义基于 UUID 的标识符新类型
///
/// 生成的类型带有 `new` (UUID v7)、`from_uuid`、`Display`、`FromStr` 与 serde 支持。
#[macro_export]
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::derive_more::Display,
            ::derive_more::From,
        )]
        #[display("{_0}")]
        pub struct $name(pub ::uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(::uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(::uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// 租户 ID
    TenantId
);

uuid_id!(
    /// 用户 ID
    UserId
);

uuid_id!(
    /// 角色 ID
    RoleId
);

/// 审计信息
///
/// 所有实体共享：创建时间、可选的更新时间、软删除标记。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl AuditInfo {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
        }
    }

    /// 记录一次更新
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// 标记为已删除
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new()
    }
}
