//! Directory listing renderers for LIST, MLSD and NLST

use chrono::{DateTime, Utc};

use crate::constants::FALLBACK_MODIFY_TIME;
use crate::storage::DirEntry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListingFormat {
    /// Loose human-readable listing
    List,
    /// RFC 3659 machine listing
    Mlsd,
    /// Bare names
    Nlst,
}

/// Render all entries in `format`, CRLF after every line
pub fn render_listing(entries: &[DirEntry], format: ListingFormat) -> String {
    let mut out = String::new();
    for entry in entries {
        match format {
            ListingFormat::List => render_list_entry(&mut out, entry),
            ListingFormat::Mlsd => render_mlsd_entry(&mut out, entry),
            ListingFormat::Nlst => {
                out.push_str(&entry.name);
                out.push_str("\r\n");
            }
        }
    }
    out
}

fn render_list_entry(out: &mut String, entry: &DirEntry) {
    if entry.is_dir {
        out.push_str(&format!("+r,s <DIR> {}\r\n", entry.name));
    } else {
        out.push_str(&format!("+r,s{}\r\n,\t{}\r\n", entry.size, entry.name));
    }
}

fn render_mlsd_entry(out: &mut String, entry: &DirEntry) {
    let modify = modify_timestamp(entry);
    if entry.is_dir {
        out.push_str(&format!("Type=dir;modify={};{}\r\n", modify, entry.name));
    } else {
        out.push_str(&format!(
            "Type=file;Size={};modify={};{}\r\n",
            entry.size, modify, entry.name
        ));
    }
}

/// `YYYYMMDDHHMMSS` in UTC
pub fn modify_timestamp(entry: &DirEntry) -> String {
    match entry.modified {
        Some(time) => DateTime::<Utc>::from(time).format("%Y%m%d%H%M%S").to_string(),
        None => FALLBACK_MODIFY_TIME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn entries() -> Vec<DirEntry> {
        vec![
            DirEntry {
                name: "a.txt".into(),
                size: 10,
                is_dir: false,
                modified: Some(UNIX_EPOCH + Duration::from_secs(1_684_166_816)),
            },
            DirEntry {
                name: "logs".into(),
                size: 0,
                is_dir: true,
                modified: None,
            },
        ]
    }

    #[test]
    fn list_uses_size_and_name_lines() {
        assert_eq!(
            render_listing(&entries(), ListingFormat::List),
            "+r,s10\r\n,\ta.txt\r\n+r,s <DIR> logs\r\n"
        );
    }

    #[test]
    fn mlsd_uses_fourteen_digit_timestamps() {
        assert_eq!(
            render_listing(&entries(), ListingFormat::Mlsd),
            "Type=file;Size=10;modify=20230515160656;a.txt\r\n\
             Type=dir;modify=20000101000000;logs\r\n"
        );
    }

    #[test]
    fn nlst_is_one_name_per_line() {
        assert_eq!(
            render_listing(&entries(), ListingFormat::Nlst),
            "a.txt\r\nlogs\r\n"
        );
    }
}
