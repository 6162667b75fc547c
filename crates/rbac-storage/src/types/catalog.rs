//! The fixed catalog of controllable actions.
//!
//! Every action is a `(codename, label)` pair stored as a [`super::Permission`]
//! in [`CATALOG_CATEGORY`]. Backends seed the catalog on open; nothing in this
//! workspace enforces the actions at runtime.

/// Category shared by every permission this system manages.
pub const CATALOG_CATEGORY: &str = "permission.permissionlist";

/// One guardable operation on a test case or environment config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllableAction {
    CreateTestCase,
    EditTestCase,
    DeleteTestCase,
    ViewTestCase,
    CreateEnvConfig,
    EditEnvConfig,
    DeleteEnvConfig,
    ViewEnvConfig,
}

impl ControllableAction {
    /// Catalog order; seeding inserts in this order.
    pub const ALL: [ControllableAction; 8] = [
        ControllableAction::CreateTestCase,
        ControllableAction::EditTestCase,
        ControllableAction::DeleteTestCase,
        ControllableAction::ViewTestCase,
        ControllableAction::CreateEnvConfig,
        ControllableAction::EditEnvConfig,
        ControllableAction::DeleteEnvConfig,
        ControllableAction::ViewEnvConfig,
    ];

    pub fn codename(&self) -> &'static str {
        match self {
            ControllableAction::CreateTestCase => "create_test_case",
            ControllableAction::EditTestCase => "edit_test_case",
            ControllableAction::DeleteTestCase => "delete_test_case",
            ControllableAction::ViewTestCase => "view_test_case",
            ControllableAction::CreateEnvConfig => "create_env_config",
            ControllableAction::EditEnvConfig => "edit_env_config",
            ControllableAction::DeleteEnvConfig => "delete_env_config",
            ControllableAction::ViewEnvConfig => "view_env_config",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControllableAction::CreateTestCase => "创建测试用例",
            ControllableAction::EditTestCase => "编辑测试用例",
            ControllableAction::DeleteTestCase => "删除测试用例",
            ControllableAction::ViewTestCase => "查看测试用例",
            ControllableAction::CreateEnvConfig => "创建环境配置",
            ControllableAction::EditEnvConfig => "编辑环境配置",
            ControllableAction::DeleteEnvConfig => "删除环境配置",
            ControllableAction::ViewEnvConfig => "查看环境配置",
        }
    }
}
