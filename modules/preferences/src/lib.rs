//! Last-connected server slot, kept in a small YAML file next to the server cache.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use servercache_core::ServerRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The part of a server needed to reconnect without consulting the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastServer {
    pub host_name: String,
    pub ip_address: String,
    pub ping: String,
    pub speed: i64,
    pub country_long: String,
    pub country_short: String,
    pub config_data: String,
    pub port: i32,
    pub protocol: String,
}

impl From<&ServerRecord> for LastServer {
    fn from(s: &ServerRecord) -> Self {
        LastServer {
            host_name: s.host_name.clone(),
            ip_address: s.ip_address.clone(),
            ping: s.ping.clone(),
            speed: s.speed,
            country_long: s.country_long.clone(),
            country_short: s.country_short.clone(),
            config_data: s.config_data.clone(),
            port: s.port,
            protocol: s.protocol.clone(),
        }
    }
}

impl LastServer {
    pub fn into_record(self) -> ServerRecord {
        ServerRecord {
            ping: self.ping,
            speed: self.speed,
            country_long: self.country_long,
            country_short: self.country_short,
            config_data: self.config_data,
            port: self.port,
            protocol: self.protocol,
            ..ServerRecord::new(self.host_name, self.ip_address)
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_server: Option<LastServer>,
}

pub struct PreferenceCache {
    path: PathBuf,
}

impl PreferenceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferenceCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_server(&self, server: &ServerRecord) -> Result<()> {
        let prefs = Preferences { last_server: Some(LastServer::from(server)) };
        self.write(&prefs)?;
        tracing::debug!(host = %server.host_name, "saved last server");
        Ok(())
    }

    /// `None` when nothing was saved yet. A file that cannot be parsed is an error.
    pub fn server(&self) -> Result<Option<LastServer>> {
        Ok(self.read()?.last_server)
    }

    pub fn has_server(&self) -> bool {
        matches!(self.server(), Ok(Some(_)))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }

    fn read(&self) -> Result<Preferences> {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        serde_yaml::from_str(&s).with_context(|| format!("parsing {}", self.path.display()))
    }

    // Written beside the target and renamed over it, so readers never see half a file.
    fn write(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let body = serde_yaml::to_string(prefs)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerRecord {
        ServerRecord {
            ping: "14".into(),
            speed: 120_000_000,
            country_long: "Korea Republic of".into(),
            country_short: "KR".into(),
            config_data: "cmVtb3RlIDEuMi4zLjQK".into(),
            port: 1195,
            protocol: "UDP".into(),
            score: 55,
            is_starred: true,
            ..ServerRecord::new("vpn-kr-3", "1.2.3.4")
        }
    }

    #[test]
    fn empty_cache_has_no_server() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceCache::new(dir.path().join("prefs.yaml"));
        assert!(!prefs.has_server());
        assert_eq!(prefs.server().unwrap(), None);
    }

    #[test]
    fn saved_server_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceCache::new(dir.path().join("sub").join("prefs.yaml"));
        prefs.save_server(&sample()).unwrap();

        assert!(prefs.has_server());
        let last = prefs.server().unwrap().unwrap();
        assert_eq!(last, LastServer::from(&sample()));

        let rec = last.into_record();
        assert_eq!(rec.host_name, "vpn-kr-3");
        assert_eq!(rec.port, 1195);
        assert_eq!(rec.score, 0);
        assert!(!rec.is_starred);
    }

    #[test]
    fn saving_again_overwrites_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceCache::new(dir.path().join("prefs.yaml"));
        prefs.save_server(&sample()).unwrap();
        prefs.save_server(&ServerRecord::new("vpn-jp-1", "5.6.7.8")).unwrap();
        assert_eq!(prefs.server().unwrap().unwrap().host_name, "vpn-jp-1");
    }

    #[test]
    fn clear_removes_the_slot_and_tolerates_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceCache::new(dir.path().join("prefs.yaml"));
        prefs.save_server(&sample()).unwrap();
        prefs.clear().unwrap();
        prefs.clear().unwrap();
        assert!(!prefs.has_server());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.yaml");
        fs::write(&path, "last_server: [not, a, map").unwrap();
        let prefs = PreferenceCache::new(&path);
        assert!(prefs.server().is_err());
        assert!(!prefs.has_server());
    }
}
