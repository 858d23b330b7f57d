use secrecy::SecretString;

/// Credentials for authenticating with the CarLo WebAPI.
///
/// `username`, `password` and `organization_number` are exchanged for a
/// bearer token at `POST /login`. The `api_key` is a static secret sent
/// alongside the token as `X-API-KEY` on every data request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Tenant number inside the CarLo installation (usually `"1"`).
    pub organization_number: String,
    pub api_key: SecretString,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        organization_number: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            organization_number: organization_number.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }
}
