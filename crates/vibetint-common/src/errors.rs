use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("settings read error: {0}")]
    Read(String),

    #[error("settings write error: {0}")]
    Write(String),

    #[error("settings parse error: {0}")]
    Parse(String),

    #[error("no workspace is open")]
    NoWorkspace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_error_display() {
        let err = SettingsError::FileNotFound(PathBuf::from("/tmp/missing.json"));
        assert_eq!(err.to_string(), "settings file not found: /tmp/missing.json");

        let err = SettingsError::Parse("unexpected token".into());
        assert_eq!(err.to_string(), "settings parse error: unexpected token");

        let err = SettingsError::Write("disk full".into());
        assert_eq!(err.to_string(), "settings write error: disk full");

        let err = SettingsError::NoWorkspace;
        assert_eq!(err.to_string(), "no workspace is open");
    }

    #[test]
    fn read_error_display() {
        let err = SettingsError::Read("permission denied".into());
        assert!(err.to_string().contains("permission denied"));
    }
}
