use chainsweep as cs;
use wasm_bindgen::prelude::*;

/// The engine, as driven from inside a Web Worker. Every message crossing
/// the boundary is bcs-encoded.
#[wasm_bindgen]
pub struct Solver {
    engine: cs::Engine,
}

#[wasm_bindgen]
impl Solver {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Solver {
        console_error_panic_hook::set_once();

        Solver {
            engine: cs::Engine::new(),
        }
    }

    /// Handles one encoded host message. Returns the encoded response for
    /// requests, nothing otherwise.
    pub fn post(&mut self, bts: Vec<u8>) -> Result<Option<Vec<u8>>, String> {
        console_error_panic_hook::set_once();

        self.engine.handle_bytes(&bts).map_err(|e| e.to_string())
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes an Init message. `cells` is row-major; -1 marks a mine, -2 a
/// cell the engine must not assume, 0-8 a clue.
#[wasm_bindgen]
pub fn encode_init(mines: usize, width: usize, cells: Vec<i8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    if width == 0 || cells.len() % width != 0 {
        return Err("ragged_rows".to_string());
    }
    let rows = cells
        .chunks(width)
        .map(|row| {
            row.iter()
                .map(|&cell| match cell {
                    -1 => cs::Tile::Mine,
                    n if n >= 0 => cs::Tile::Clue(n as u8),
                    _ => cs::Tile::Unknown,
                })
                .collect()
        })
        .collect();
    cs::message::encode(&cs::HostMessage::Init { mines, rows }).map_err(|e| e.to_string())
}

/// Encodes a Reveal message from flat `[x0, y0, x1, y1, ...]` coordinates.
#[wasm_bindgen]
pub fn encode_reveal(coords: Vec<u32>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let points = coords
        .chunks_exact(2)
        .map(|pair| cs::Point::new(pair[0] as usize, pair[1] as usize))
        .collect();
    cs::message::encode(&cs::HostMessage::Reveal(points)).map_err(|e| e.to_string())
}

/// Encodes a Request message: 0 = safes, 1 = flags, 2 = lowest.
#[wasm_bindgen]
pub fn encode_request(kind: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let kind = decode_kind(kind).ok_or_else(|| "unknown_request".to_string())?;
    cs::message::encode(&cs::HostMessage::Request(kind)).map_err(|e| e.to_string())
}

/// The request kind of an encoded response, numbered as in `encode_request`.
#[wasm_bindgen]
pub fn response_kind(bts: Vec<u8>) -> Result<u8, String> {
    console_error_panic_hook::set_once();

    let response = decode_response(&bts)?;
    Ok(match response.kind {
        cs::RequestKind::Safes => 0,
        cs::RequestKind::Flags => 1,
        cs::RequestKind::Lowest => 2,
    })
}

/// The cells of an encoded response as flat `[x0, y0, x1, y1, ...]`.
#[wasm_bindgen]
pub fn response_cells(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let response = decode_response(&bts)?;
    Ok(response
        .cells
        .into_iter()
        .flat_map(|p| [p.x as u32, p.y as u32])
        .collect())
}

/// The fingerprint words of an encoded response. Each word fits in 53 bits,
/// so the conversion to JS numbers is exact.
#[wasm_bindgen]
pub fn response_fingerprint(bts: Vec<u8>) -> Result<Vec<f64>, String> {
    console_error_panic_hook::set_once();

    let response = decode_response(&bts)?;
    Ok(response.fingerprint.into_iter().map(|w| w as f64).collect())
}

fn decode_kind(kind: u8) -> Option<cs::RequestKind> {
    match kind {
        0 => Some(cs::RequestKind::Safes),
        1 => Some(cs::RequestKind::Flags),
        2 => Some(cs::RequestKind::Lowest),
        _ => None,
    }
}

fn decode_response(bts: &[u8]) -> Result<cs::Response, String> {
    cs::message::decode(bts).map_err(|e| e.to_string())
}
