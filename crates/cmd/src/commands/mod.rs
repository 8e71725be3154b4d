// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod checkpoint;
pub mod copy;
pub mod list;
pub mod mkdir;
pub mod put;
pub mod remove;
pub mod rename;
pub mod stat;
pub mod touch;

pub use cat::cat_command;
pub use checkpoint::{
    checkpoint_create_command, checkpoint_delete_command, checkpoint_list_command,
    checkpoint_restore_command,
};
pub use copy::copy_command;
pub use list::list_command;
pub use mkdir::mkdir_command;
pub use put::{PutSource, put_command};
pub use remove::remove_command;
pub use rename::rename_command;
pub use stat::stat_command;
pub use touch::touch_command;
