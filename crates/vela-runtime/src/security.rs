//! Security and permission configuration
//!
//! Host I/O exposed through native modules is denied by default and requires
//! explicit grants. The embedding host builds a [`SecurityContext`] and hands
//! it to the engine; native modules check it before every filesystem,
//! process, or environment operation.

use crate::value::RuntimeError;
use thiserror::Error;

/// Security errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("filesystem read access to {path}")]
    FilesystemReadDenied { path: String },

    #[error("filesystem write access to {path}")]
    FilesystemWriteDenied { path: String },

    #[error("process execution of {command}")]
    ProcessDenied { command: String },

    #[error("environment variable {var}")]
    EnvironmentDenied { var: String },
}

impl From<SecurityError> for RuntimeError {
    fn from(err: SecurityError) -> Self {
        let (operation, target) = match &err {
            SecurityError::FilesystemReadDenied { path } => ("filesystem read", path.clone()),
            SecurityError::FilesystemWriteDenied { path } => ("filesystem write", path.clone()),
            SecurityError::ProcessDenied { command } => ("process", command.clone()),
            SecurityError::EnvironmentDenied { var } => ("environment", var.clone()),
        };
        RuntimeError::PermissionDenied {
            operation: operation.to_string(),
            target,
        }
    }
}

/// Active permission grants for one session.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    fs_read: bool,
    fs_write: bool,
    process: bool,
    environment: bool,
}

impl SecurityContext {
    /// Secure by default: everything denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant every capability. Intended for trusted embeddings and tests.
    pub fn allow_all() -> Self {
        SecurityContext {
            fs_read: true,
            fs_write: true,
            process: true,
            environment: true,
        }
    }

    pub fn grant_filesystem_read(&mut self) -> &mut Self {
        self.fs_read = true;
        self
    }

    pub fn grant_filesystem_write(&mut self) -> &mut Self {
        self.fs_write = true;
        self
    }

    pub fn grant_process(&mut self) -> &mut Self {
        self.process = true;
        self
    }

    pub fn grant_environment(&mut self) -> &mut Self {
        self.environment = true;
        self
    }

    pub fn check_filesystem_read(&self, path: &str) -> Result<(), SecurityError> {
        if self.fs_read {
            Ok(())
        } else {
            Err(SecurityError::FilesystemReadDenied {
                path: path.to_string(),
            })
        }
    }

    pub fn check_filesystem_write(&self, path: &str) -> Result<(), SecurityError> {
        if self.fs_write {
            Ok(())
        } else {
            Err(SecurityError::FilesystemWriteDenied {
                path: path.to_string(),
            })
        }
    }

    pub fn check_process(&self, command: &str) -> Result<(), SecurityError> {
        if self.process {
            Ok(())
        } else {
            Err(SecurityError::ProcessDenied {
                command: command.to_string(),
            })
        }
    }

    pub fn check_environment(&self, var: &str) -> Result<(), SecurityError> {
        if self.environment {
            Ok(())
        } else {
            Err(SecurityError::EnvironmentDenied {
                var: var.to_string(),
            })
        }
    }
}
