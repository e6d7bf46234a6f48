pub mod all;
pub mod create;
pub mod down;
pub mod init;
pub mod list;
pub mod locks;
pub mod status;
pub mod up;
pub mod upto;
pub mod version;

pub use all::cmd_all;
pub use create::cmd_create;
pub use down::cmd_down;
pub use init::cmd_init;
pub use list::cmd_list;
pub use locks::{cmd_lock, cmd_unlock};
pub use status::cmd_status;
pub use up::cmd_up;
pub use upto::cmd_upto;
pub use version::cmd_version;
