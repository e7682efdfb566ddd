//! Test-only helpers for driving decoders over byte slices.

use crate::{
    config::DecoderConfig,
    cursor::Reader,
    error::{Anomaly, DecodeError},
    hooks::{LabelRecorder, NoopObserver},
};

/// Outcome of running a decoder over a buffer from offset zero.
#[derive(Debug)]
pub struct Decoded<T> {
    pub result: Result<T, DecodeError>,
    /// Reader position after the decoder returned.
    pub position: usize,
    pub anomalies: Vec<Anomaly>,
}

impl<T> Decoded<T> {
    /// Unwrap the decoded value, panicking with `context` on failure.
    pub fn expect(self, context: &str) -> T { self.result.expect(context) }
}

/// Run `decode` over `bytes` with the default configuration.
pub fn decode_with<T>(
    bytes: &[u8],
    decode: impl FnOnce(&mut Reader<'_, '_>) -> Result<T, DecodeError>,
) -> Decoded<T> {
    decode_with_config(bytes, DecoderConfig::default(), decode)
}

/// Run `decode` over `bytes` with an explicit configuration.
pub fn decode_with_config<T>(
    bytes: &[u8],
    config: DecoderConfig,
    decode: impl FnOnce(&mut Reader<'_, '_>) -> Result<T, DecodeError>,
) -> Decoded<T> {
    let mut observer = NoopObserver;
    let mut reader = Reader::new(bytes, 0, config, &mut observer);
    let result = decode(&mut reader);
    Decoded {
        result,
        position: reader.position(),
        anomalies: reader.take_anomalies(),
    }
}

/// Run `decode` over `bytes`, also returning the emitted labels.
pub fn decode_labelled<T>(
    bytes: &[u8],
    decode: impl FnOnce(&mut Reader<'_, '_>) -> Result<T, DecodeError>,
) -> (Decoded<T>, LabelRecorder) {
    let mut recorder = LabelRecorder::new();
    let decoded = {
        let mut reader = Reader::new(bytes, 0, DecoderConfig::default(), &mut recorder);
        let result = decode(&mut reader);
        Decoded {
            result,
            position: reader.position(),
            anomalies: reader.take_anomalies(),
        }
    };
    (decoded, recorder)
}
