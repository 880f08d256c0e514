//! Cheap guess whether a path can be fed to the transcoder.
//!
//! Known extensions decide immediately. Files without a recognised extension
//! get a short header read and are matched against common container
//! signatures.

use std::fs::File;
use std::io::Read;
use std::path::Path;

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "m4b", "aac", "ogg", "oga", "opus", "flac", "wav", "wv", "aif", "aiff", "aifc",
    "ape", "wma", "ac3", "eac3", "dts", "mka", "mpc", "amr", "au", "caf", "tta", "alac", "spx",
    "mp2", "dsf", "weba",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "mts", "m2ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg",
    "3gp", "ogv", "vob", "asf",
];

/// Extensions that are never sniffed.
const NON_MEDIA_EXTENSIONS: &[&str] = &[
    "txt", "md", "log", "nfo", "cue", "m3u", "m3u8", "pls", "xspf", "pdf", "doc", "docx", "rtf",
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "svg", "ico", "srt", "ass", "ssa",
    "vtt", "sub", "lrc", "zip", "rar", "7z", "tar", "gz", "xz", "exe", "dll", "so", "iso", "json",
    "xml", "toml", "yaml", "yml", "ini", "html", "htm", "db", "mid", "midi",
];

const SNIFF_LEN: usize = 16;

pub fn may_be_audio_or_video_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
        if NON_MEDIA_EXTENSIONS.contains(&ext.as_str()) {
            return false;
        }
    }

    match read_header(path) {
        Some(header) => has_media_signature(&header),
        None => false,
    }
}

fn read_header(path: &Path) -> Option<Vec<u8>> {
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .ok()?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buf)
        .ok()?;
    Some(buf)
}

fn has_media_signature(header: &[u8]) -> bool {
    let at = |offset: usize, magic: &[u8]| header.get(offset..offset + magic.len()) == Some(magic);

    at(0, b"ID3")
        || at(0, b"fLaC")
        || at(0, b"OggS")
        || at(0, b"MAC ")
        || at(0, b"wvpk")
        || at(0, b"caff")
        || at(0, b"#!AMR")
        || at(0, b".snd")
        || at(0, &[0x1a, 0x45, 0xdf, 0xa3]) // EBML (mkv, webm)
        || at(0, &[0x30, 0x26, 0xb2, 0x75]) // ASF (wma, wmv)
        || at(0, &[0x00, 0x00, 0x01, 0xba]) // MPEG program stream
        || at(0, b"FLV")
        || (at(0, b"RIFF") && (at(8, b"WAVE") || at(8, b"AVI ")))
        || (at(0, b"FORM") && (at(8, b"AIFF") || at(8, b"AIFC")))
        || at(4, b"ftyp")
        || is_mpeg_audio_frame(header)
}

fn is_mpeg_audio_frame(header: &[u8]) -> bool {
    match header {
        // frame sync plus a valid layer, or an ADTS header
        [0xff, second, ..] => {
            second & 0xe0 == 0xe0 && (second & 0x06 != 0 || second & 0xf6 == 0xf0)
        }
        _ => false,
    }
}
