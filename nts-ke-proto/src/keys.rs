use crate::channel::KeyingMaterialExporter;
use crate::decoder::NegotiatedData;
use crate::error::KeyExchangeError;
use crate::identifiers::AeadAlgorithm;

pub const EXPORTER_LABEL: &[u8] = b"EXPORTER-network-time-security";

/// Session keys are always derived for AES-SIV-CMAC-256, the only algorithm
/// we request.
const KEY_ALGORITHM: AeadAlgorithm = AeadAlgorithm::AeadAesSivCmac256;

/// A 32 byte symmetric key. The bytes are never shown in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; SessionKey::LENGTH]);

impl SessionKey {
    pub const LENGTH: usize = 32;

    pub fn from_bytes(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionKey").field(&"<redacted>").finish()
    }
}

fn export_key(
    exporter: &impl KeyingMaterialExporter,
    context: &[u8],
) -> Result<SessionKey, KeyExchangeError> {
    let mut key = [0; SessionKey::LENGTH];
    exporter
        .export_keying_material(&mut key, EXPORTER_LABEL, context)
        .map_err(|e| KeyExchangeError::KeyExportFailed(Box::new(e)))?;

    Ok(SessionKey(key))
}

/// Derives both session keys and stores them in `data`.
///
/// Neither key is stored unless both exports succeed.
pub fn export_session_keys(
    exporter: &impl KeyingMaterialExporter,
    data: &mut NegotiatedData,
) -> Result<(), KeyExchangeError> {
    let s2c = export_key(exporter, &KEY_ALGORITHM.s2c_context())?;
    let c2s = export_key(exporter, &KEY_ALGORITHM.c2s_context())?;

    data.s2c_key = Some(s2c);
    data.c2s_key = Some(c2s);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("export refused")]
    struct Refused;

    /// Fills the output with bytes derived from label and context, optionally
    /// failing on one specific call.
    struct FakeExporter {
        fail_on_call: Option<usize>,
        calls: Cell<usize>,
    }

    impl FakeExporter {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                fail_on_call,
                calls: Cell::new(0),
            }
        }
    }

    impl KeyingMaterialExporter for FakeExporter {
        type Error = Refused;

        fn export_keying_material(
            &self,
            output: &mut [u8],
            label: &[u8],
            context: &[u8],
        ) -> Result<(), Refused> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if self.fail_on_call == Some(call) {
                return Err(Refused);
            }

            let seed = label
                .iter()
                .chain(context)
                .fold(0u8, |acc, b| acc.wrapping_mul(31).wrapping_add(*b));
            for (i, byte) in output.iter_mut().enumerate() {
                *byte = seed.wrapping_add(i as u8);
            }

            Ok(())
        }
    }

    #[test]
    fn test_export_both_keys() {
        let exporter = FakeExporter::new(None);
        let mut data = NegotiatedData::new("192.0.2.1");
        export_session_keys(&exporter, &mut data).unwrap();

        let c2s = data.c2s_key.clone().unwrap();
        let s2c = data.s2c_key.clone().unwrap();
        assert_ne!(c2s, s2c);
        assert_eq!(exporter.calls.get(), 2);

        let mut expected = [0; SessionKey::LENGTH];
        exporter
            .export_keying_material(&mut expected, EXPORTER_LABEL, &[0, 0, 0, 0x0f, 0])
            .unwrap();
        assert_eq!(c2s.as_bytes(), &expected);

        exporter
            .export_keying_material(&mut expected, EXPORTER_LABEL, &[0, 0, 0, 0x0f, 1])
            .unwrap();
        assert_eq!(s2c.as_bytes(), &expected);
    }

    #[test]
    fn test_export_failure_sets_no_keys() {
        for fail_on_call in [0, 1] {
            let exporter = FakeExporter::new(Some(fail_on_call));
            let mut data = NegotiatedData::new("192.0.2.1");

            assert!(matches!(
                export_session_keys(&exporter, &mut data),
                Err(KeyExchangeError::KeyExportFailed(_))
            ));
            assert_eq!(data.c2s_key, None);
            assert_eq!(data.s2c_key, None);
        }
    }

    #[test]
    fn test_debug_hides_key() {
        let key = SessionKey::from_bytes([0xab; SessionKey::LENGTH]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("171"));
        assert!(!debug.to_lowercase().contains("ab"));
        assert!(debug.contains("redacted"));
    }
}
