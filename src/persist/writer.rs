//! persist::writer
//!
//! Replaces the contents of one group with a job's results.
//!
//! # Steps
//!
//! 1. Validate the value names. Nothing is touched if one is bad.
//! 2. Create the group (and parents), or delete its children if it exists.
//!    Attributes on an existing group are kept.
//! 3. Dump each value in caller order.
//! 4. Stamp provenance attributes.
//! 5. Optionally rebuild the `debug` subgroup from a cache.
//!
//! There is no rollback. If step 3 fails on value `k`, values before it
//! stay in the group and the rest are never written; the partial group is
//! flushed when the handle is released.

use std::collections::HashSet;

use thiserror::Error;

use super::args::ArgsRecord;
use super::cache::{Cache, CacheError, CacheKey};
use super::provenance::ProvenanceRecorder;
use crate::core::types::{GroupPath, NodeName, DEBUG_GROUP};
use crate::store::handle::{StoreError, StoreHandle};
use crate::store::node::{Group, Node, PathError};
use crate::store::value::{Dump, DumpError, Value};
use crate::ui::output::Logger;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid result name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("result name '{0}' given more than once")]
    DuplicateName(String),

    #[error("result name '{0}' is reserved")]
    ReservedName(String),

    #[error(transparent)]
    NotAGroup(#[from] PathError),

    #[error("failed to store '{name}': {source}")]
    Serialization {
        name: String,
        #[source]
        source: DumpError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request to dump a cache into the `debug` subgroup.
pub struct DebugSideChannel<'a> {
    pub cache: &'a dyn Cache,
    /// Extra names to leave out besides the primary results.
    pub skip_names: Vec<String>,
}

impl<'a> DebugSideChannel<'a> {
    pub fn new(cache: &'a dyn Cache) -> Self {
        Self {
            cache,
            skip_names: Vec::new(),
        }
    }

    pub fn skipping<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_names.extend(names.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Debug for DebugSideChannel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSideChannel")
            .field("skip_names", &self.skip_names)
            .finish_non_exhaustive()
    }
}

/// What a write produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Primary results, in the order written.
    pub written: Vec<String>,
    /// Children created under `debug`.
    pub debug_written: Vec<String>,
    /// Cache entries left out of `debug`.
    pub debug_skipped: Vec<String>,
}

#[derive(Debug)]
pub struct ResultWriter<'a> {
    logger: &'a Logger,
    provenance: ProvenanceRecorder,
}

impl<'a> ResultWriter<'a> {
    pub fn new(logger: &'a Logger, provenance: ProvenanceRecorder) -> Self {
        Self { logger, provenance }
    }

    /// Replace the children of `path` with `values`.
    ///
    /// # Errors
    ///
    /// - `InvalidName`, `DuplicateName`, `ReservedName` before any change
    /// - `NotAGroup` if a dataset occupies `path` or a parent
    /// - `Serialization` for a value that cannot be stored; earlier values
    ///   remain written
    /// - `Cache` if the debug cache fails to load an entry
    /// - `Store` if the handle is read-only
    pub fn write(
        &self,
        handle: &mut StoreHandle,
        path: &GroupPath,
        values: &[(String, Value)],
        args: &ArgsRecord,
        debug: Option<&DebugSideChannel<'_>>,
    ) -> Result<WriteReport, WriteError> {
        let names = validate_names(values)?;

        let group = handle.root_mut()?.require_group(path)?;
        group.clear_children();

        let mut report = WriteReport::default();
        for (name, (_, value)) in names.iter().zip(values) {
            value
                .dump(group, name)
                .map_err(|source| WriteError::Serialization {
                    name: name.to_string(),
                    source,
                })?;
            report.written.push(name.to_string());
        }

        self.provenance.stamp(group, args);

        if let Some(debug) = debug {
            let primary = report.written.clone();
            self.write_debug(group, &primary, debug, &mut report)?;
        }

        if self.logger.do_info() {
            self.logger
                .info(format!("Results written to {}:{}", handle.path().display(), path));
        }
        Ok(report)
    }

    /// Like [`write`](Self::write), with each primary value loaded from
    /// `cache` under the one-part key `(name,)`.
    ///
    /// Every name is loaded before the group is touched, so a missing entry
    /// leaves the store unchanged.
    pub fn write_cached(
        &self,
        handle: &mut StoreHandle,
        path: &GroupPath,
        names: &[&str],
        cache: &dyn Cache,
        args: &ArgsRecord,
        debug: Option<&DebugSideChannel<'_>>,
    ) -> Result<WriteReport, WriteError> {
        let values = names
            .iter()
            .map(|name| Ok((name.to_string(), cache.load(&CacheKey::named(*name))?)))
            .collect::<Result<Vec<_>, CacheError>>()?;
        self.write(handle, path, &values, args, debug)
    }

    fn write_debug(
        &self,
        group: &mut Group,
        primary: &[String],
        debug: &DebugSideChannel<'_>,
        report: &mut WriteReport,
    ) -> Result<(), WriteError> {
        let debug_name = NodeName::new(DEBUG_GROUP).map_err(|e| WriteError::InvalidName {
            name: DEBUG_GROUP.to_string(),
            reason: e.to_string(),
        })?;
        group.remove(&debug_name);

        let keys = debug.cache.keys();
        let synthesized: Vec<String> = keys.iter().map(CacheKey::synthesized_name).collect();
        let mut taken: HashSet<&str> = primary
            .iter()
            .chain(&debug.skip_names)
            .map(String::as_str)
            .collect();
        let mut debug_group = Group::new();

        for (key, name) in keys.iter().zip(&synthesized) {
            let child = match NodeName::new(name.as_str()) {
                Ok(child) if taken.insert(name.as_str()) => child,
                _ => {
                    report.debug_skipped.push(name.clone());
                    continue;
                }
            };

            let value = debug.cache.load(key)?;
            value
                .dump(&mut debug_group, &child)
                .map_err(|source| WriteError::Serialization {
                    name: format!("{}/{}", DEBUG_GROUP, name),
                    source,
                })?;
            report.debug_written.push(name.clone());
        }

        if self.logger.do_debug() {
            self.logger.debug(format!(
                "debug: {} written, {} skipped",
                report.debug_written.len(),
                report.debug_skipped.len()
            ));
        }
        group.insert(debug_name, Node::Group(debug_group));
        Ok(())
    }
}

fn validate_names(values: &[(String, Value)]) -> Result<Vec<NodeName>, WriteError> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|(name, _)| {
            let node = NodeName::new(name.as_str()).map_err(|e| WriteError::InvalidName {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            if node.is_debug() {
                return Err(WriteError::ReservedName(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(WriteError::DuplicateName(name.clone()));
            }
            Ok(node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;
    use crate::persist::cache::MemoryCache;
    use crate::store::handle::OpenMode;
    use crate::store::node::{AttrValue, Dataset};
    use crate::store::value::{NdArray, Scalar};
    use crate::ui::output::{Level, MemorySink, Verbosity};
    use tempfile::TempDir;

    fn recorder() -> ProvenanceRecorder {
        ProvenanceRecorder::new(vec!["job".into(), "--x".into()], "/work")
    }

    fn path(s: &str) -> GroupPath {
        GroupPath::parse(s).unwrap()
    }

    fn values(pairs: Vec<(&str, Value)>) -> Vec<(String, Value)> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    struct Fixture {
        _dir: TempDir,
        handle: StoreHandle,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let handle = StoreHandle::open(dir.path().join("out.json"), OpenMode::Append).unwrap();
        Fixture { _dir: dir, handle }
    }

    #[test]
    fn replaces_children_and_keeps_attrs() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());
        fx.handle
            .root_mut()
            .unwrap()
            .require_group(&path("/res"))
            .unwrap()
            .set_attr("note", "kept");

        writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("a", 1.into()), ("b", 2.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap();
        let report = writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("c", 1.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap();

        let g = fx.handle.group(&path("/res")).unwrap();
        assert_eq!(g.child_names(), vec!["c"]);
        assert_eq!(report.written, vec!["c"]);
        assert_eq!(g.attr("note"), Some(&AttrValue::from("kept")));
        assert_eq!(g.attr("cmdline"), Some(&AttrValue::from("job --x")));
    }

    #[test]
    fn bad_names_leave_store_untouched() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());
        writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("old", 1.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap();
        let before = fx.handle.root().clone();

        let attempts = [
            values(vec![("a/b", 1.into())]),
            values(vec![("x", 1.into()), ("x", 2.into())]),
            values(vec![("debug", 1.into())]),
        ];
        let mut errors = Vec::new();
        for pairs in &attempts {
            errors.push(
                writer
                    .write(&mut fx.handle, &path("/res"), pairs, &ArgsRecord::new(), None)
                    .unwrap_err(),
            );
            assert_eq!(fx.handle.root(), &before);
        }

        assert!(matches!(errors[0], WriteError::InvalidName { .. }));
        assert!(matches!(errors[1], WriteError::DuplicateName(ref n) if n == "x"));
        assert!(matches!(errors[2], WriteError::ReservedName(_)));
    }

    #[test]
    fn dataset_in_the_way_is_not_a_group() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());
        writer
            .write(
                &mut fx.handle,
                &GroupPath::root(),
                &values(vec![("res", 1.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap();

        let err = writer
            .write(
                &mut fx.handle,
                &path("/res/inner"),
                &values(vec![("x", 1.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, WriteError::NotAGroup(_)));
    }

    #[test]
    fn failure_keeps_earlier_values_only() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());
        let broken = Value::Array(NdArray {
            shape: vec![2, 2],
            data: crate::store::value::ArrayData::Float(vec![1.0]),
        });

        let err = writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("first", 1.into()), ("bad", broken), ("last", 3.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap_err();

        assert!(matches!(err, WriteError::Serialization { ref name, .. } if name == "bad"));
        let g = fx.handle.group(&path("/res")).unwrap();
        assert_eq!(g.child_names(), vec!["first"]);
    }

    #[test]
    fn debug_skips_collisions_and_duplicates() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());

        let mut cache = MemoryCache::new();
        cache
            .insert(cache_key!["charges"], 9.0)
            .insert(cache_key!["at_weights", 0], vec![0.5, 0.5])
            .insert(cache_key!["extra"], 1.0)
            .insert(cache_key!["at", "weights_0"], 2.0)
            .insert(cache_key!["a/b"], 3.0)
            .insert(cache_key!["scratch"], 4.0);
        let debug = DebugSideChannel::new(&cache).skipping(["scratch"]);

        let report = writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("charges", Value::from(vec![0.1, -0.1]))]),
                &ArgsRecord::new(),
                Some(&debug),
            )
            .unwrap();

        let g = fx.handle.group(&path("/res")).unwrap();
        assert_eq!(
            g.dataset("charges"),
            Some(&Dataset::Array(NdArray::from_vec(vec![0.1, -0.1])))
        );
        let dbg = g.subgroup("debug").unwrap();
        assert_eq!(dbg.child_names(), vec!["at_weights_0", "extra"]);
        assert_eq!(
            dbg.dataset("at_weights_0"),
            Some(&Dataset::Array(NdArray::from_vec(vec![0.5, 0.5])))
        );
        assert_eq!(report.debug_written, vec!["at_weights_0", "extra"]);
        assert_eq!(
            report.debug_skipped,
            vec!["charges", "at_weights_0", "a/b", "scratch"]
        );
    }

    #[test]
    fn debug_group_is_rebuilt() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());

        let mut first = MemoryCache::new();
        first.insert(cache_key!["old"], 1.0);
        let mut second = MemoryCache::new();
        second.insert(cache_key!["new"], 2.0);

        for cache in [&first, &second] {
            writer
                .write(
                    &mut fx.handle,
                    &path("/res"),
                    &values(vec![("e", 1.into())]),
                    &ArgsRecord::new(),
                    Some(&DebugSideChannel::new(cache)),
                )
                .unwrap();
        }

        let dbg = fx.handle.group(&path("/res/debug")).unwrap();
        assert_eq!(dbg.child_names(), vec!["new"]);
    }

    #[test]
    fn write_cached_loads_by_name() {
        let mut fx = fixture();
        let logger = Logger::silent();
        let writer = ResultWriter::new(&logger, recorder());

        let mut cache = MemoryCache::new();
        cache
            .insert(cache_key!["charges"], vec![0.2, -0.2])
            .insert(cache_key!["populations"], vec![8.8, 1.2]);

        writer
            .write_cached(
                &mut fx.handle,
                &path("/wpart/he"),
                &["charges", "populations"],
                &cache,
                &ArgsRecord::new(),
                None,
            )
            .unwrap();
        let g = fx.handle.group(&path("/wpart/he")).unwrap();
        assert_eq!(g.child_names(), vec!["charges", "populations"]);

        let err = writer
            .write_cached(
                &mut fx.handle,
                &path("/wpart/he"),
                &["charges", "missing"],
                &cache,
                &ArgsRecord::new(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, WriteError::Cache(CacheError::Missing(_))));
        let g = fx.handle.group(&path("/wpart/he")).unwrap();
        assert_eq!(g.child_names(), vec!["charges", "populations"]);
    }

    #[test]
    fn info_log_names_target() {
        let mut fx = fixture();
        let sink = MemorySink::new();
        let logger = Logger::new(Verbosity::Info, sink.clone());
        let writer = ResultWriter::new(&logger, recorder());

        writer
            .write(
                &mut fx.handle,
                &path("/res"),
                &values(vec![("e", Scalar::Float(1.23).into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap();

        let infos = sink.messages(Level::Info);
        assert_eq!(infos.len(), 1);
        assert!(infos[0].starts_with("Results written to "));
        assert!(infos[0].ends_with("out.json:/res"));
    }

    #[test]
    fn read_only_handle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out.json");
        StoreHandle::open(&file, OpenMode::Append)
            .unwrap()
            .close()
            .unwrap();
        let mut handle = StoreHandle::open(&file, OpenMode::Read).unwrap();

        let logger = Logger::silent();
        let err = ResultWriter::new(&logger, recorder())
            .write(
                &mut handle,
                &path("/res"),
                &values(vec![("e", 1.into())]),
                &ArgsRecord::new(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, WriteError::Store(StoreError::ReadOnly(_))));
    }
}
