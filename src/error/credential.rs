use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CredentialError {
    #[error("shared credential for virtual project {project_id} has been released")]
    ParentReleased { project_id: String },

    #[error("credential {id} has no access token; refresh first")]
    MissingAccessToken { id: String },
}
