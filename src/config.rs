//! Application-level configuration constants.

// UI Behavior
pub const TEMPLATE_DEBOUNCE_MS: u32 = 3000;

// localStorage keys
pub const STORAGE_COOLDOWNS: &str = "cooldowns";
pub const STORAGE_TEMPLATE: &str = "template";

// Input placeholders
pub const NAME_PLACEHOLDER: &str = "{spell:70940} Name";
pub const COOLDOWN_PLACEHOLDER: &str = "Cooldown (sec)";
pub const GROUPS_PLACEHOLDER: &str = "Group Names";
pub const GROUPS_INPUT_SIZE: u32 = 50;
