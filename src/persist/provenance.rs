//! persist::provenance
//!
//! Stamps a result group with how it was produced: the command line, the
//! working directory, a timestamp, and every argument that was given.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};

use super::args::ArgsRecord;
use crate::store::node::Group;

pub const ATTR_CMDLINE: &str = "cmdline";
pub const ATTR_PWD: &str = "pwd";
pub const ATTR_DATETIME: &str = "datetime";
/// Prefix of per-argument attributes, `arg_<name>`.
pub const ARG_PREFIX: &str = "arg_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRecorder {
    argv: Vec<String>,
    cwd: PathBuf,
}

impl ProvenanceRecorder {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
        }
    }

    /// Capture this process's argument vector and working directory.
    pub fn from_env() -> io::Result<Self> {
        let argv = std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        Ok(Self::new(argv, std::env::current_dir()?))
    }

    /// Arguments joined by single spaces.
    pub fn cmdline(&self) -> String {
        self.argv.join(" ")
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Stamp `group` using the current local time.
    pub fn stamp(&self, group: &mut Group, args: &ArgsRecord) {
        self.stamp_at(group, args, Local::now());
    }

    /// Stamp `group` with an explicit timestamp.
    ///
    /// Arguments without a value are skipped, so an `arg_<name>` left by an
    /// earlier write stays as it was.
    pub fn stamp_at(&self, group: &mut Group, args: &ArgsRecord, at: DateTime<Local>) {
        group.set_attr(ATTR_CMDLINE, self.cmdline());
        group.set_attr(ATTR_PWD, self.cwd.to_string_lossy().into_owned());
        group.set_attr(
            ATTR_DATETIME,
            at.to_rfc3339_opts(SecondsFormat::Micros, false),
        );
        for (name, value) in args.present() {
            group.set_attr(format!("{}{}", ARG_PREFIX, name), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::node::AttrValue;
    use chrono::TimeZone;

    fn recorder() -> ProvenanceRecorder {
        ProvenanceRecorder::new(
            vec!["wpart".into(), "in.fchk".into(), "--lmax".into(), "3".into()],
            "/work/run1",
        )
    }

    #[test]
    fn records_cmdline_and_pwd() {
        let mut g = Group::new();
        recorder().stamp(&mut g, &ArgsRecord::new());

        assert_eq!(
            g.attr(ATTR_CMDLINE),
            Some(&AttrValue::from("wpart in.fchk --lmax 3"))
        );
        assert_eq!(g.attr(ATTR_PWD), Some(&AttrValue::from("/work/run1")));
        assert!(g.attr(ATTR_DATETIME).is_some());
    }

    #[test]
    fn datetime_has_microseconds() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 5)
            .single()
            .unwrap();
        let mut g = Group::new();
        recorder().stamp_at(&mut g, &ArgsRecord::new(), at);

        let Some(AttrValue::Scalar(crate::store::value::Scalar::Str(text))) =
            g.attr(ATTR_DATETIME)
        else {
            panic!("datetime missing");
        };
        assert!(text.starts_with("2024-03-01T12:30:05.000000"), "{}", text);
        assert!(DateTime::parse_from_rfc3339(text).is_ok());
    }

    #[test]
    fn null_args_are_omitted() {
        let mut args = ArgsRecord::new();
        args.set("alpha", 0.5).unset("beta");

        let mut g = Group::new();
        recorder().stamp(&mut g, &args);

        assert_eq!(g.attr("arg_alpha"), Some(&AttrValue::from(0.5)));
        assert!(g.attr("arg_beta").is_none());
    }

    #[test]
    fn stale_arg_attr_survives_null() {
        let mut g = Group::new();
        g.set_attr("arg_beta", 7);

        let mut args = ArgsRecord::new();
        args.unset("beta");
        recorder().stamp(&mut g, &args);

        assert_eq!(g.attr("arg_beta"), Some(&AttrValue::from(7)));
    }

    #[test]
    fn from_env_captures_cwd() {
        let rec = ProvenanceRecorder::from_env().unwrap();
        assert_eq!(rec.cwd(), std::env::current_dir().unwrap());
    }
}
