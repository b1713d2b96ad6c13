//! BIFF8 record framing and string encodings

/// Largest record payload; longer data continues in CONTINUE records
pub const MAX_RECORD_DATA: usize = 8224;

pub mod id {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const CODEPAGE: u16 = 0x0042;
    pub const DATEMODE: u16 = 0x0022;
    pub const WINDOW1: u16 = 0x003D;
    pub const FONT: u16 = 0x0031;
    pub const FORMAT: u16 = 0x041E;
    pub const XF: u16 = 0x00E0;
    pub const STYLE: u16 = 0x0293;
    pub const PALETTE: u16 = 0x0092;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SUPBOOK: u16 = 0x01AE;
    pub const EXTERNSHEET: u16 = 0x0017;
    pub const NAME: u16 = 0x0018;
    pub const MSODRAWINGGROUP: u16 = 0x00EB;
    pub const MSODRAWING: u16 = 0x00EC;
    pub const OBJ: u16 = 0x005D;
    pub const SST: u16 = 0x00FC;
    pub const CONTINUE: u16 = 0x003C;
    pub const GUTS: u16 = 0x0080;
    pub const WSBOOL: u16 = 0x0081;
    pub const HEADER: u16 = 0x0014;
    pub const FOOTER: u16 = 0x0015;
    pub const LEFTMARGIN: u16 = 0x0026;
    pub const RIGHTMARGIN: u16 = 0x0027;
    pub const TOPMARGIN: u16 = 0x0028;
    pub const BOTTOMMARGIN: u16 = 0x0029;
    pub const SETUP: u16 = 0x00A1;
    pub const DIMENSIONS: u16 = 0x0200;
    pub const COLINFO: u16 = 0x007D;
    pub const ROW: u16 = 0x0208;
    pub const LABELSST: u16 = 0x00FD;
    pub const NUMBER: u16 = 0x0203;
    pub const BOOLERR: u16 = 0x0205;
    pub const BLANK: u16 = 0x0201;
    pub const WINDOW2: u16 = 0x023E;
    pub const PANE: u16 = 0x0041;
    pub const MERGEDCELLS: u16 = 0x00E5;
    pub const HLINK: u16 = 0x01B8;
}

/// A BIFF stream under construction
#[derive(Debug, Default)]
pub struct BiffWriter {
    data: Vec<u8>,
}

impl BiffWriter {
    pub fn new() -> Self {
        BiffWriter::default()
    }

    /// Write a record, spilling into CONTINUE records past the size limit
    pub fn record(&mut self, record_id: u16, payload: &[u8]) {
        let mut chunks = payload.chunks(MAX_RECORD_DATA);
        let first = chunks.next().unwrap_or(&[]);
        self.raw_record(record_id, first);
        for chunk in chunks {
            self.raw_record(id::CONTINUE, chunk);
        }
    }

    fn raw_record(&mut self, record_id: u16, payload: &[u8]) {
        self.data.extend_from_slice(&record_id.to_le_bytes());
        self.data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        self.data.extend_from_slice(payload);
    }

    /// Write a record whose CONTINUE boundaries were decided by the caller
    pub fn record_parts(&mut self, record_id: u16, parts: &[Vec<u8>]) {
        for (i, part) in parts.iter().enumerate() {
            self.raw_record(if i == 0 { record_id } else { id::CONTINUE }, part);
        }
    }

    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// Overwrite four bytes at an absolute position
    pub fn patch_u32(&mut self, position: usize, value: u32) {
        self.data[position..position + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn append(&mut self, other: BiffWriter) {
        self.data.extend(other.data);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Little-endian payload builder
#[derive(Debug, Default)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Payload(Vec::with_capacity(32))
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

/// Character data of a BIFF8 string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChars {
    /// UTF-16 code units
    pub units: Vec<u16>,
    /// True when every unit fits in one byte
    pub compressed: bool,
}

impl EncodedChars {
    pub fn new(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        let compressed = units.iter().all(|u| *u < 0x100);
        EncodedChars { units, compressed }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn flags(&self) -> u8 {
        if self.compressed {
            0x00
        } else {
            0x01
        }
    }

    pub fn bytes_per_char(&self) -> usize {
        if self.compressed {
            1
        } else {
            2
        }
    }

    /// Character bytes for units `[from, to)`
    pub fn bytes(&self, from: usize, to: usize) -> Vec<u8> {
        let slice = &self.units[from..to];
        if self.compressed {
            slice.iter().map(|u| *u as u8).collect()
        } else {
            slice.iter().flat_map(|u| u.to_le_bytes()).collect()
        }
    }
}

/// XLUnicodeString: 16-bit length, flags, characters
pub fn unicode_string(text: &str) -> Vec<u8> {
    let chars = EncodedChars::new(&truncate_units(text, u16::MAX as usize));
    let mut out = Vec::with_capacity(3 + chars.len() * chars.bytes_per_char());
    out.extend_from_slice(&(chars.len() as u16).to_le_bytes());
    out.push(chars.flags());
    out.extend(chars.bytes(0, chars.len()));
    out
}

/// ShortXLUnicodeString: 8-bit length, flags, characters
pub fn short_unicode_string(text: &str) -> Vec<u8> {
    let chars = EncodedChars::new(&truncate_units(text, u8::MAX as usize));
    let mut out = Vec::with_capacity(2 + chars.len() * chars.bytes_per_char());
    out.push(chars.len() as u8);
    out.push(chars.flags());
    out.extend(chars.bytes(0, chars.len()));
    out
}

/// Keep at most `max` UTF-16 units without splitting a surrogate pair
pub fn truncate_units(text: &str, max: usize) -> String {
    let mut units = 0;
    let mut out = String::new();
    for c in text.chars() {
        units += c.len_utf16();
        if units > max {
            break;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_framing() {
        let mut w = BiffWriter::new();
        w.record(id::EOF, &[]);
        assert_eq!(w.into_bytes(), vec![0x0A, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_long_record_continues() {
        let mut w = BiffWriter::new();
        w.record(id::MSODRAWINGGROUP, &vec![0u8; MAX_RECORD_DATA + 10]);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), MAX_RECORD_DATA + 10 + 8);
        let second = 4 + MAX_RECORD_DATA;
        assert_eq!(&bytes[second..second + 4], &[0x3C, 0x00, 10, 0x00]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(unicode_string("Ab"), vec![2, 0, 0, b'A', b'b']);
        assert_eq!(short_unicode_string("é"), vec![1, 0, 0xE9]);
        assert_eq!(unicode_string("€"), vec![1, 0, 1, 0xAC, 0x20]);
        assert_eq!(truncate_units("a😀b", 2), "a");
    }
}
