// platform/linux.rs - procfs backend: /proc/<pid>/maps for modules,
// positioned reads of /proc/<pid>/mem for memory.

use super::{file_name_matches, MemoryReader, ModuleInfo, Platform};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

/// An opened target process.
#[derive(Debug)]
pub struct RemoteProcess {
    pid: u32,
    mem: File,
}

impl RemoteProcess {
    /// Find the process by executable name and open its memory for reading.
    pub fn open(name: &str) -> Result<Self> {
        let pid = find_process_id(name).ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        let mem = File::open(format!("/proc/{pid}/mem")).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ProcessNotFound(name.to_string()),
            _ => Error::AccessDenied(format!("/proc/{pid}/mem: {e}")),
        })?;
        Ok(Self { pid, mem })
    }

    fn proc_path(&self, file: &str) -> PathBuf {
        PathBuf::from(format!("/proc/{}/{}", self.pid, file))
    }
}

impl MemoryReader for RemoteProcess {
    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<()> {
        self.mem
            .read_exact_at(buf, address as u64)
            .map_err(|_| Error::ReadFault { address, size: buf.len() })
    }
}

impl Platform for RemoteProcess {
    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        let maps = fs::read_to_string(self.proc_path("maps"))?;
        Ok(parse_maps(&maps))
    }

    fn is_alive(&self) -> bool {
        self.proc_path("stat").exists()
    }
}

/// One module per mapped file: lowest start address, span up to its highest end.
fn parse_maps(maps: &str) -> Vec<ModuleInfo> {
    let mut order = Vec::new();
    let mut spans: HashMap<String, (usize, usize)> = HashMap::new();

    for line in maps.lines() {
        // "start-end perms offset dev inode pathname"; the pathname may contain spaces
        let (range, mut rest) = next_field(line);
        for _ in 0..4 {
            rest = next_field(rest).1;
        }
        let path = rest.trim();
        if !path.starts_with('/') {
            continue;
        }
        let Some((start, end)) = range.split_once('-') else { continue };
        let (Ok(start), Ok(end)) = (usize::from_str_radix(start, 16), usize::from_str_radix(end, 16))
        else {
            continue;
        };

        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        spans
            .entry(name.clone())
            .and_modify(|s| {
                s.0 = s.0.min(start);
                s.1 = s.1.max(end);
            })
            .or_insert_with(|| {
                order.push(name);
                (start, end)
            });
    }

    order
        .into_iter()
        .filter_map(|name| {
            let (start, end) = spans.get(&name).copied()?;
            Some(ModuleInfo { name, base_address: start, size: end - start })
        })
        .collect()
}

/// Split off the first whitespace-separated field, returning it and the remainder.
fn next_field(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    line.split_at(end)
}

/// Scan /proc for a process whose argv[0] or comm matches `name`.
fn find_process_id(name: &str) -> Option<u32> {
    fs::read_dir("/proc").ok()?.flatten().find_map(|entry| {
        let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
        let dir = entry.path();

        let argv0_matches = fs::read(dir.join("cmdline")).ok().is_some_and(|cmdline| {
            let argv0 = cmdline.split(|&b| b == 0).next().unwrap_or_default();
            file_name_matches(&String::from_utf8_lossy(argv0), name)
        });
        let comm_matches = fs::read_to_string(dir.join("comm"))
            .ok()
            .is_some_and(|comm| comm.trim_end().eq_ignore_ascii_case(name));

        (argv0_matches || comm_matches).then_some(pid)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 08:01 131 /usr/bin/dota2
55d0c0a02000-55d0c0a10000 r-xp 00002000 08:01 131 /usr/bin/dota2
7f00aa000000-7f00aa400000 r--p 00000000 08:01 777 /games/dota/bin/libclient.so
7f00aa400000-7f00ab000000 r-xp 00400000 08:01 777 /games/dota/bin/libclient.so
7ffd1c000000-7ffd1c021000 rw-p 00000000 00:00 0 [stack]
7f00b0000000-7f00b0001000 rw-p 00000000 00:00 0
";

    #[test]
    fn maps_collapse_into_modules() {
        let modules = parse_maps(MAPS);
        assert_eq!(modules.len(), 2);

        assert_eq!(modules[0].name, "dota2");
        assert_eq!(modules[0].base_address, 0x55d0c0a00000);

        assert_eq!(modules[1].name, "libclient.so");
        assert_eq!(modules[1].base_address, 0x7f00aa000000);
        assert_eq!(modules[1].size, 0x1000000);
    }

    #[test]
    fn module_paths_may_contain_spaces() {
        let maps = "\
7f10c0000000-7f10c0400000 r--p 00000000 08:01 901                        /home/u/.steam/steamapps/common/dota 2 beta/game/dota/bin/linuxsteamrt64/libclient.so
7f10c0400000-7f10c1000000 r-xp 00400000 08:01 901                        /home/u/.steam/steamapps/common/dota 2 beta/game/dota/bin/linuxsteamrt64/libclient.so
7f10d0000000-7f10d0100000 r--p 00000000 08:01 902 /home/u/.steam/steamapps/common/dota 2 beta/game/bin/linuxsteamrt64/libengine2.so
";
        let modules = parse_maps(maps);
        let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["libclient.so", "libengine2.so"]);
        assert_eq!(modules[0].base_address, 0x7f10c0000000);
        assert_eq!(modules[0].size, 0x1000000);
    }

    #[test]
    fn missing_process_is_not_found() {
        let err = RemoteProcess::open("no-such-process-4b1d9e.exe").unwrap_err();
        assert!(matches!(err, Error::ProcessNotFound(_)));
    }

    #[test]
    fn reads_own_memory() {
        let me = RemoteProcess {
            pid: std::process::id(),
            mem: File::open("/proc/self/mem").unwrap(),
        };
        let value: u64 = 0xDEAD_BEEF_CAFE_F00D;
        let addr = &value as *const u64 as usize;
        assert_eq!(me.read_u64(addr).unwrap(), value);
        assert!(me.read_u64(0).is_err());
        assert!(me.is_alive());
    }
}
