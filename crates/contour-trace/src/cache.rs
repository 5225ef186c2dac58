//! Binary strip cache.
//!
//! One file per contour set. All integers are big-endian `i64`:
//! a level count, then per level a strip count followed by that level's
//! strips (each a node count and the node indices), then the grid
//! spacing as two `f64` values, then the discontinuity count and
//! indices. Levels themselves are not stored; they are reconstructed
//! from the active configuration on load.

use bytes::{Buf, BufMut, BytesMut};
use contour_engine::{sentinel_magnitude, EngineConfig};
use field_common::{ContourResult, IsoCurveSet, Strip, StripList};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Encode a contour set into the cache wire format.
pub fn encode(set: &IsoCurveSet) -> Vec<u8> {
    let records = 1 + set.level_count() + set.total_strips() + set.total_nodes() + 3 + set.discontinuities.len();
    let mut buf = BytesMut::with_capacity(records * 8);

    buf.put_i64(set.lists.len() as i64);
    for list in &set.lists {
        buf.put_i64(list.len() as i64);
        for strip in list {
            buf.put_i64(strip.len() as i64);
            for &node in strip.nodes() {
                buf.put_i64(node as i64);
            }
        }
    }
    buf.put_f64(set.map.delta_x());
    buf.put_f64(set.map.delta_y());
    buf.put_i64(set.discontinuities.len() as i64);
    for &index in &set.discontinuities {
        buf.put_i64(index as i64);
    }

    buf.to_vec()
}

/// Decode a cached set, validating it against the active configuration.
///
/// Returns `None` when the record layout is malformed or truncated, when
/// any node index falls outside the configured grid, when the stored
/// grid spacing differs from the configuration's, or when the level
/// count matches neither the configured levels nor a healed generation
/// (configured levels plus two fences, with discontinuities recorded).
pub fn decode(mut buf: &[u8], config: &EngineConfig) -> Option<IsoCurveSet> {
    let map = config.node_map();
    let node_limit = map.node_count();

    let level_count = take_count(&mut buf)?;
    let mut lists = Vec::with_capacity(level_count);
    for _ in 0..level_count {
        let strip_count = take_count(&mut buf)?;
        if strip_count > buf.remaining() / 8 {
            return None;
        }
        let mut list = StripList::with_capacity(strip_count);
        for _ in 0..strip_count {
            let node_count = take_count(&mut buf)?;
            if node_count > buf.remaining() / 8 {
                return None;
            }
            let mut nodes = Vec::with_capacity(node_count);
            for _ in 0..node_count {
                let node = take_count(&mut buf)?;
                if node >= node_limit {
                    return None;
                }
                nodes.push(node);
            }
            list.push(Strip::from_nodes(nodes));
        }
        lists.push(list);
    }

    let delta_x = take_f64(&mut buf)?;
    let delta_y = take_f64(&mut buf)?;
    if delta_x != map.delta_x() || delta_y != map.delta_y() {
        return None;
    }

    let disc_count = take_count(&mut buf)?;
    if disc_count > buf.remaining() / 8 {
        return None;
    }
    let mut discontinuities = BTreeSet::new();
    for _ in 0..disc_count {
        let index = take_count(&mut buf)?;
        if index >= node_limit {
            return None;
        }
        discontinuities.insert(index);
    }
    if buf.has_remaining() {
        return None;
    }

    let levels = reconstruct_levels(config, level_count, !discontinuities.is_empty())?;
    Some(IsoCurveSet::new(levels, lists, map, discontinuities))
}

/// Rebuild the level list for a cached set.
///
/// A healed generation carries the configured levels plus the two fence
/// levels the engine appended; recomputing the fences from the
/// configuration reproduces them exactly.
fn reconstruct_levels(config: &EngineConfig, level_count: usize, healed: bool) -> Option<Vec<f64>> {
    if level_count == config.levels.len() {
        return Some(config.levels.clone());
    }
    if healed && level_count == config.levels.len() + 2 {
        let fence = sentinel_magnitude(&config.levels);
        let mut levels = config.levels.clone();
        levels.push(-fence);
        levels.push(fence);
        return Some(levels);
    }
    None
}

fn take_count(buf: &mut &[u8]) -> Option<usize> {
    if buf.remaining() < 8 {
        return None;
    }
    usize::try_from(buf.get_i64()).ok()
}

fn take_f64(buf: &mut &[u8]) -> Option<f64> {
    if buf.remaining() < 8 {
        return None;
    }
    Some(buf.get_f64())
}

/// Write the cache file atomically: encode into a temporary file in the
/// destination directory, then rename it over the target path.
pub fn persist(set: &IsoCurveSet, path: &Path) -> ContourResult<()> {
    let bytes = encode(set);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = bytes.len(), "strip cache written");
    Ok(())
}

/// Try to adopt a cached set for this configuration.
///
/// A missing or unreadable file, a level-count or spacing mismatch, and
/// a malformed record layout all return `None`; the caller falls through
/// to full regeneration.
pub fn load(path: &Path, config: &EngineConfig) -> Option<IsoCurveSet> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(path = %path.display(), %error, "strip cache not readable");
            return None;
        }
    };

    let set = decode(&bytes, config);
    if set.is_none() {
        warn!(path = %path.display(), "discarding strip cache that does not match the configuration");
    }
    set
}
