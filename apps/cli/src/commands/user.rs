//! # User Commands

use clap::Subcommand;
use serde::Serialize;
use tracing::info;

use super::{print_json, Context};
use crate::error::ApiError;
use tally_core::User;

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create an account for --user / --password
    Register,
    /// Show the authenticated account
    Whoami,
}

/// Account as printed; never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

pub async fn run(ctx: &Context, command: UserCommand) -> Result<(), ApiError> {
    match command {
        UserCommand::Register => {
            let (email, password) = ctx.config.credentials()?;
            let user = ctx.db.users().register(email, password).await?;
            info!(email = %user.email, "Account created");
            print_json(&UserView::from(user))
        }
        UserCommand::Whoami => {
            let user = ctx.user().await?;
            print_json(&UserView::from(user))
        }
    }
}
