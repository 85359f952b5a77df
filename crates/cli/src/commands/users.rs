//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! comfycart users list
//! ```

use comfycart_storefront::db::{PgUserRepository, UserRepository};
use comfycart_storefront::models::User;

use super::{CommandError, connect};

fn format_row(user: &User) -> String {
    format!(
        "{:>6}  {:<32}  {:<24}  {}",
        user.id,
        user.email,
        user.name,
        user.created_at.format("%Y-%m-%d %H:%M")
    )
}

/// Print every registered user, oldest first.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = PgUserRepository::new(pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:>6}  {:<32}  {:<24}  created", "id", "email", "name");
        for user in &users {
            println!("{}", format_row(user));
        }
        println!("{} user(s)", users.len());
    }
    Ok(())
}
