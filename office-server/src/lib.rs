//! Office Server - ISP 后台管理服务
//!
//! # 架构概述
//!
//! 本模块是 Office Server 的主入口，提供以下核心功能：
//!
//! - **账单** (`billing`): 月度批量开单、折扣与收款规则
//! - **派单** (`dispatch`): 外勤工单阶段机
//! - **台账** (`ledger`): 收款员与公司的双币现金规则
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! office-server/src/
//! ├── core/          # 配置、状态、错误
//! ├── auth/          # JWT 认证、权限
//! ├── billing/       # 账单领域规则
//! ├── dispatch/      # 工单阶段机
//! ├── ledger/        # 现金台账规则
//! ├── events/        # Socket.IO 实时事件
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 工具函数
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod events;
pub mod ledger;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv, 日志)
pub fn setup_environment() -> core::Result<()> {
    dotenv::dotenv().ok();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ____  ____  _
  / __ \/ __// _(_)______
 / / / / /_ / /_/ / ___/ _ \
/ /_/ / __// __/ / /__/  __/
\____/_/  /_/ /_/\___/\___/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
