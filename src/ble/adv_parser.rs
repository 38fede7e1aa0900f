use heapless::String;

use crate::ble::PeripheralFilter;

/// AD type: Shortened Local Name.
pub const AD_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
/// AD type: Complete Local Name.
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// One `[length][type][value...]` advertisement record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdRecord<'a> {
    pub ad_type: u8,
    pub value: &'a [u8],
}

/// Iterator over the AD records in a raw advertisement payload.
///
/// A zero length byte is padding and is stepped over one byte at a time.
/// A record that claims more bytes than the payload holds ends iteration.
pub struct AdRecords<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AdRecords<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for AdRecords<'a> {
    type Item = AdRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let len = self.data[self.pos] as usize;
            if len == 0 {
                self.pos += 1;
                continue;
            }

            let end = self.pos + 1 + len;
            if end > self.data.len() {
                self.pos = self.data.len();
                return None;
            }

            let record = AdRecord {
                ad_type: self.data[self.pos + 1],
                value: &self.data[self.pos + 2..end],
            };
            self.pos = end;
            return Some(record);
        }
        None
    }
}

/// Check whether an advertisement names the peripheral we are looking for.
///
/// Stops at the first complete-local-name record that matches, so a
/// match is reported once per advertisement no matter what follows it.
pub fn matches_peer(data: &[u8], filter: &PeripheralFilter) -> bool {
    AdRecords::new(data)
        .filter(|record| record.ad_type == AD_TYPE_COMPLETE_LOCAL_NAME)
        .any(|record| filter.matches_name(record.value))
}

/// Value of the first complete-local-name record, if there is one.
pub fn complete_local_name(data: &[u8]) -> Option<&[u8]> {
    AdRecords::new(data)
        .find(|record| record.ad_type == AD_TYPE_COMPLETE_LOCAL_NAME)
        .map(|record| record.value)
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let found = AdRecords::new(data).find(|record| {
        record.ad_type == AD_TYPE_SHORT_LOCAL_NAME || record.ad_type == AD_TYPE_COMPLETE_LOCAL_NAME
    });

    let mut name = String::new();
    match found {
        Some(record) => {
            for &b in record.value {
                if name.push(b as char).is_err() {
                    break;
                }
            }
        }
        None => {
            let _ = name.push_str("Unknown");
        }
    }
    name
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════
