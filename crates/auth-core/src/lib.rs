//! cuba-auth-core - 认证核心库
//!
//! 主体 (Principal) 与声明 (Claim) 模型，以及权限声明的物化约定

use cuba_config::AuthorizationConfig;
use serde::{Deserialize, Serialize};

/// 单条声明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// 当前请求的主体
///
/// 声明在登录或签发令牌时已经物化，授权阶段只读。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: Option<String>,
    #[serde(default)]
    claims: Vec<Claim>,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            claims: Vec::new(),
        }
    }

    /// 匿名主体 (无任何声明)
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_claim(Claim::new(claim_type, value));
        self
    }

    /// 添加声明，完全相同的声明只保留一份
    pub fn add_claim(&mut self, claim: Claim) {
        if !self.claims.contains(&claim) {
            self.claims.push(claim);
        }
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// 某一类型的全部声明值
    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }
}

/// 权限声明约定
///
/// 物化方 (登录/签发令牌) 与授权处理器共享同一个 `claim_type`，每个有效权限名对应一条声明。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionClaims {
    claim_type: String,
}

impl PermissionClaims {
    pub fn new(claim_type: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
        }
    }

    /// 使用授权配置中的声明类型
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self::new(config.claim_type.clone())
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    /// 将解析后的有效权限集合写入主体
    pub fn materialize<I, S>(&self, principal: &mut Principal, permission_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in permission_names {
            principal.add_claim(Claim::new(self.claim_type.clone(), name));
        }
    }

    /// 主体上携带的权限名
    pub fn permissions<'a>(&'a self, principal: &'a Principal) -> Vec<&'a str> {
        principal.find_all(&self.claim_type).collect()
    }
}
