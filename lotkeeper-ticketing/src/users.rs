use std::sync::Arc;

use lotkeeper_core::{authorize, Capability, LotError, LotResult, Repositories};
use lotkeeper_shared::{Role, User};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

pub(crate) async fn resolve_actor(repos: &Repositories, id: Uuid) -> LotResult<User> {
    repos
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| LotError::not_found("User", id))
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

/// Attendants and admins of the lot
#[derive(Clone)]
pub struct UserDirectory {
    repos: Repositories,
    registration: Arc<Mutex<()>>,
}

impl UserDirectory {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            registration: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_user(&self, id: Uuid) -> LotResult<User> {
        resolve_actor(&self.repos, id).await
    }

    /// Sorted by last name, then first name
    pub async fn list_users(&self, role: Option<Role>) -> LotResult<Vec<User>> {
        let mut users: Vec<User> = self
            .repos
            .users
            .list_users()
            .await?
            .into_iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .collect();
        users.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(users)
    }

    /// Admin only. Emails are unique, compared case-insensitively.
    pub async fn create_user(&self, actor_id: Uuid, new: NewUser) -> LotResult<User> {
        let actor = resolve_actor(&self.repos, actor_id).await?;
        authorize(&actor, Capability::ManageLot)?;

        if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
            return Err(LotError::Validation("first and last name are required".into()));
        }
        if !is_plausible_email(&new.email) {
            return Err(LotError::Validation(format!("invalid email '{}'", new.email)));
        }

        let user = User::new(&new.first_name, &new.last_name, &new.email, new.role);

        let _registering = self.registration.lock().await;
        if self.repos.users.find_by_email(&user.email).await?.is_some() {
            return Err(LotError::Conflict(format!("email {} already registered", user.email)));
        }
        self.repos.users.save_user(&user).await?;

        info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "User created");
        Ok(user)
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
