//! Parameter decoding engine
//!
//! Decodes the raw parameter payload of a record according to the typed
//! parameter list of its message template. Parameters are consumed strictly
//! in template order; each type determines how many bytes it takes.

use crate::manifest::{ParameterDescriptor, ParameterType};
use crate::translator::ErrorTranslator;
use byteorder::{ByteOrder, LittleEndian};
use uuid::Uuid;

/// A parameter would read past the end of the record payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterOverrun {
    /// Name of the parameter that did not fit
    pub parameter: String,
    /// Payload cursor at which it started
    pub cursor: usize,
}

/// Parameter decoder - renders typed parameters as `name: value`
pub struct ParameterDecoder;

impl ParameterDecoder {
    /// Decode all parameters of a template from a record payload
    ///
    /// # Arguments
    /// * `params` - Parameter descriptors, in payload order
    /// * `payload` - Record payload (bounded by the record's declared length)
    /// * `cursor` - Payload offset of the first parameter
    /// * `translator` - Resolves `commonError` codes
    ///
    /// # Returns
    /// * Rendered `"name: value"` strings and the cursor after the last parameter
    /// * `Err(ParameterOverrun)` as soon as one parameter does not fit
    pub fn decode_parameters(
        params: &[ParameterDescriptor],
        payload: &[u8],
        cursor: usize,
        translator: &dyn ErrorTranslator,
    ) -> Result<(Vec<String>, usize), ParameterOverrun> {
        let mut rendered = Vec::with_capacity(params.len());
        let mut cursor = cursor;

        for param in params {
            let (value, next) = Self::decode_value(param.param_type, payload, cursor, translator)
                .ok_or_else(|| ParameterOverrun {
                    parameter: param.name.clone(),
                    cursor,
                })?;
            rendered.push(format!("{}: {}", param.name, value));
            cursor = next;
        }

        Ok((rendered, cursor))
    }

    /// Decode one value at `cursor`, returning it with the advanced cursor
    ///
    /// Returns `None` if the value does not fit in the payload.
    pub fn decode_value(
        param_type: ParameterType,
        payload: &[u8],
        cursor: usize,
        translator: &dyn ErrorTranslator,
    ) -> Option<(String, usize)> {
        let rest = payload.get(cursor..)?;

        let Some(width) = param_type.fixed_width() else {
            // The terminator must lie inside the payload
            let nul = rest.iter().position(|&b| b == 0)?;
            let value = String::from_utf8_lossy(&rest[..nul]).into_owned();
            return Some((value, cursor + nul + 1));
        };

        let field = rest.get(..width)?;
        let value = match param_type {
            ParameterType::Integer => LittleEndian::read_i32(field).to_string(),
            ParameterType::UnsignedInteger => LittleEndian::read_u32(field).to_string(),
            ParameterType::IpAddress => {
                format!("{}.{}.{}.{}", field[0], field[1], field[2], field[3])
            }
            ParameterType::UniqueId => {
                Uuid::from_bytes(<[u8; 16]>::try_from(field).ok()?).to_string()
            }
            ParameterType::CommonError => translator.translate(LittleEndian::read_u32(field)),
            // Variable width, handled above
            ParameterType::String => return None,
        };

        Some((value, cursor + width))
    }
}
