use super::ProbeError;

#[cfg(target_os = "windows")]
use winreg::RegKey;
#[cfg(target_os = "windows")]
use winreg::enums::HKEY_CURRENT_USER;

/// Read access to string values in the platform configuration registry.
pub trait RegistryLookup {
    /// Read `value` under `key_path` in the current user's hive.
    ///
    /// `Ok(None)` means the key or value does not exist.
    fn read_string(&self, key_path: &str, value: &str) -> Result<Option<String>, ProbeError>;
}

/// The real Windows registry; reports nothing on other platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRegistry;

impl RegistryLookup for SystemRegistry {
    #[cfg(target_os = "windows")]
    fn read_string(&self, key_path: &str, value: &str) -> Result<Option<String>, ProbeError> {
        let registry_error = |source: std::io::Error| ProbeError::Registry {
            key: format!("HKEY_CURRENT_USER\\{key_path}\\{value}"),
            source,
        };
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let key = match hkcu.open_subkey(key_path) {
            Ok(key) => key,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(registry_error(err)),
        };
        match key.get_value::<String, _>(value) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(registry_error(err)),
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn read_string(&self, _key_path: &str, _value: &str) -> Result<Option<String>, ProbeError> {
        Ok(None)
    }
}
