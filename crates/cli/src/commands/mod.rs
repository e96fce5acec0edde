pub mod config;
pub mod parts;
pub mod validate;

pub use config::handle_config_command;
pub use parts::{
    handle_identifiers_command, handle_manifest_command, handle_parts_command,
    handle_remove_command, handle_save_command, handle_show_command, handle_upload_command,
};
pub use validate::handle_validate_command;
