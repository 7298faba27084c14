use std::env;

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    /// Public base URL of this deployment, used to build e-mail confirmation links.
    pub base_url: String,

    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,

    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{bind_addr}"));

        let cloudinary_cloud_name = env::var("CLOUDINARY_NAME")
            .map_err(|_| "CLOUDINARY_NAME must be set".to_string())?;
        let cloudinary_api_key = env::var("CLOUDINARY_API_KEY")
            .map_err(|_| "CLOUDINARY_API_KEY must be set".to_string())?;
        let cloudinary_api_secret = env::var("CLOUDINARY_API_SECRET")
            .map_err(|_| "CLOUDINARY_API_SECRET must be set".to_string())?;

        let mail_api_url =
            env::var("MAIL_API_URL").map_err(|_| "MAIL_API_URL must be set".to_string())?;
        let mail_api_key =
            env::var("MAIL_API_KEY").map_err(|_| "MAIL_API_KEY must be set".to_string())?;
        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@photoshare.app".to_string());

        Ok(ServerConfig {
            bind_addr,
            database_url,
            jwt_secret,
            base_url,
            cloudinary_cloud_name,
            cloudinary_api_key,
            cloudinary_api_secret,
            mail_api_url,
            mail_api_key,
            mail_from,
        })
    }
}
