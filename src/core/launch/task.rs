// ─── Launch Task ───
// Spawns the game client detached, with its output captured in the game log.

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info};

use crate::core::error::{LauncherError, LauncherResult};

/// Everything needed to start the client once the install is in place.
#[derive(Debug, Clone)]
pub struct GameLaunch {
    pub client_path: PathBuf,
    pub game_dir: PathBuf,
    pub runtime: PathBuf,
    pub user_data_dir: PathBuf,
    pub identity: String,
    pub player_name: String,
    pub log_path: PathBuf,
}

impl GameLaunch {
    /// `--app-dir <game> --java-exec <runtime> --user-dir <data>
    /// --auth-mode offline --uuid <id> --name <player>`
    pub fn arguments(&self) -> Vec<OsString> {
        vec![
            "--app-dir".into(),
            self.game_dir.as_os_str().to_owned(),
            "--java-exec".into(),
            self.runtime.as_os_str().to_owned(),
            "--user-dir".into(),
            self.user_data_dir.as_os_str().to_owned(),
            "--auth-mode".into(),
            "offline".into(),
            "--uuid".into(),
            self.identity.as_str().into(),
            "--name".into(),
            self.player_name.as_str().into(),
        ]
    }
}

/// Start the client and return its pid without waiting for it.
///
/// The log file is truncated and starts with a header naming the command;
/// the child's stdout and stderr follow it.
pub fn spawn_game(launch: &GameLaunch) -> LauncherResult<u32> {
    std::fs::create_dir_all(&launch.user_data_dir)
        .map_err(|e| LauncherError::io(&launch.user_data_dir, e))?;

    let mut cmd = Command::new(&launch.client_path);
    cmd.args(launch.arguments());
    if let Some(client_dir) = launch.client_path.parent() {
        cmd.current_dir(client_dir);
    }

    let command_line = format_command_for_logs(&cmd);
    let mut log = open_game_log(&launch.log_path, &launch.client_path, &command_line)?;

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::from(clone_log(&log, &launch.log_path)?));
    cmd.stderr(Stdio::from(clone_log(&log, &launch.log_path)?));
    configure_detached_spawn(&mut cmd);

    info!("Launching game: {:?}", launch.client_path);
    debug!("Command (copy/paste): {}", command_line);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let msg = e.to_string();
            error!("Failed to start game process: {}", msg);
            let _ = writeln!(log, "\nERROR: Failed to start game process: {msg}");
            return Err(LauncherError::GameSpawn(msg));
        }
    };
    let pid = child.id();
    info!("Game process spawned with PID: {}", pid);

    // Reap the child off-thread so it never lingers as a zombie; the
    // launcher does not act on its exit.
    std::thread::spawn(move || match child.wait() {
        Ok(status) => debug!("Game process {} exited: {}", pid, status),
        Err(e) => debug!("Could not wait on game process {}: {}", pid, e),
    });

    Ok(pid)
}

fn open_game_log(log_path: &Path, client_path: &Path, command_line: &str) -> LauncherResult<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }
    let mut log = File::create(log_path).map_err(|e| LauncherError::io(log_path, e))?;
    let header = format!(
        "Launching {} at {}\nCommand: {}\n\n",
        client_path.display(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        command_line
    );
    log.write_all(header.as_bytes())
        .and_then(|_| log.flush())
        .map_err(|e| LauncherError::io(log_path, e))?;
    Ok(log)
}

fn clone_log(log: &File, log_path: &Path) -> LauncherResult<File> {
    log.try_clone().map_err(|e| LauncherError::io(log_path, e))
}

fn configure_detached_spawn(cmd: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group: terminal signals aimed at the launcher skip the game.
        cmd.process_group(0);
    }
    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }
}

fn format_command_for_logs(cmd: &Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(root: &Path) -> GameLaunch {
        GameLaunch {
            client_path: root.join("game").join("Client").join("HytaleClient"),
            game_dir: root.join("game"),
            runtime: PathBuf::from("/usr/bin/java"),
            user_data_dir: root.join("UserData"),
            identity: "0f8e2c".into(),
            player_name: "Steve".into(),
            log_path: root.join("launcher").join("game.log"),
        }
    }

    #[test]
    fn arguments_are_fixed_offline_layout() {
        let launch = sample(Path::new("/data"));
        let args: Vec<String> = launch
            .arguments()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--app-dir",
                "/data/game",
                "--java-exec",
                "/usr/bin/java",
                "--user-dir",
                "/data/UserData",
                "--auth-mode",
                "offline",
                "--uuid",
                "0f8e2c",
                "--name",
                "Steve",
            ]
        );
    }

    #[test]
    fn shell_escape_quotes_only_when_needed() {
        assert_eq!(shell_escape("/opt/game/Client"), "/opt/game/Client");
        assert_eq!(shell_escape("My Games"), "\"My Games\"");
        assert_eq!(shell_escape(""), "\"\"");
        assert_eq!(shell_escape("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn missing_client_is_a_spawn_error_logged_to_the_game_log() {
        let dir = tempfile::tempdir().unwrap();
        let launch = sample(dir.path());

        let err = spawn_game(&launch).unwrap_err();

        assert!(matches!(err, LauncherError::GameSpawn(_)));
        let log = std::fs::read_to_string(&launch.log_path).unwrap();
        assert!(log.starts_with("Launching "));
        assert!(log.contains("ERROR: Failed to start game process"));
    }

    #[cfg(unix)]
    #[test]
    fn client_runs_detached_in_its_own_dir_with_output_in_log() {
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let launch = sample(dir.path());
        let client_dir = launch.client_path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&client_dir).unwrap();
        std::fs::write(
            &launch.client_path,
            "#!/bin/sh\necho \"cwd=$(pwd)\"\necho \"args=$*\"\ntouch done.marker\n",
        )
        .unwrap();
        crate::core::platform::mark_executable(&launch.client_path).unwrap();

        let pid = spawn_game(&launch).unwrap();
        assert!(pid > 0);
        assert!(launch.user_data_dir.is_dir());

        let marker = client_dir.join("done.marker");
        let deadline = Instant::now() + Duration::from_secs(10);
        while !marker.exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(marker.exists(), "client never ran");

        let log = std::fs::read_to_string(&launch.log_path).unwrap();
        let (header, output) = log.split_once("\n\n").unwrap();
        assert!(header.contains("Command: "));
        assert!(header.contains("--auth-mode offline"));
        assert!(output.contains("args=--app-dir"));
        assert!(output.contains("--name Steve"));
        let canonical = std::fs::canonicalize(&client_dir).unwrap();
        assert!(output.contains(&format!("cwd={}", canonical.display())));
    }

    #[test]
    fn log_is_truncated_on_each_launch() {
        let dir = tempfile::tempdir().unwrap();
        let launch = sample(dir.path());
        std::fs::create_dir_all(launch.log_path.parent().unwrap()).unwrap();
        std::fs::write(&launch.log_path, "stale output from a previous run\n").unwrap();

        let _ = spawn_game(&launch);

        let log = std::fs::read_to_string(&launch.log_path).unwrap();
        assert!(!log.contains("stale output"));
    }
}
