use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager};

use crate::io_atomic;

/// How the host session launches programs at login.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginItemKind {
    /// `~/.config/autostart/<id>.desktop`
    XdgDesktop,
    /// `~/Library/LaunchAgents/<id>.plist`
    LaunchAgent,
    /// `%APPDATA%\Microsoft\Windows\Start Menu\Programs\Startup\<name>.cmd`
    StartupScript,
}

impl LoginItemKind {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::LaunchAgent
        } else if cfg!(windows) {
            Self::StartupScript
        } else {
            Self::XdgDesktop
        }
    }

    fn base_dir(self, app: &AppHandle) -> Result<PathBuf, String> {
        let resolver = app.path();
        let dir = match self {
            Self::XdgDesktop => resolver.config_dir().map(|d| d.join("autostart")),
            Self::LaunchAgent => resolver.home_dir().map(|d| d.join("Library").join("LaunchAgents")),
            Self::StartupScript => resolver.data_dir().map(|d| {
                d.join("Microsoft")
                    .join("Windows")
                    .join("Start Menu")
                    .join("Programs")
                    .join("Startup")
            }),
        };
        dir.map_err(|e| e.to_string())
    }

    pub fn file_name(self, identifier: &str, product_name: &str) -> String {
        match self {
            Self::XdgDesktop => format!("{identifier}.desktop"),
            Self::LaunchAgent => format!("{identifier}.plist"),
            Self::StartupScript => format!("{product_name}.cmd"),
        }
    }

    pub fn render(self, identifier: &str, product_name: &str, exe: &Path) -> String {
        let exe = exe.to_string_lossy();
        match self {
            Self::XdgDesktop => format!(
                "[Desktop Entry]\nType=Application\nName={product_name}\nExec=\"{exe}\"\nX-GNOME-Autostart-enabled=true\n"
            ),
            Self::LaunchAgent => format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{identifier}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{exe}</string>
  </array>
  <key>RunAtLoad</key>
  <true/>
</dict>
</plist>
"#
            ),
            Self::StartupScript => format!("@echo off\r\nstart \"\" \"{exe}\"\r\n"),
        }
    }
}

/// The login item file for this app on this host.
pub struct LoginItem {
    kind: LoginItemKind,
    path: PathBuf,
    identifier: String,
    product_name: String,
}

impl LoginItem {
    pub fn for_app(app: &AppHandle) -> Result<Self, String> {
        let kind = LoginItemKind::current();
        let config = app.config();
        let identifier = config.identifier.clone();
        let product_name = config
            .product_name
            .clone()
            .unwrap_or_else(|| app.package_info().name.clone());
        let path = kind
            .base_dir(app)?
            .join(kind.file_name(&identifier, &product_name));
        Ok(Self::new(kind, path, identifier, product_name))
    }

    pub fn new(kind: LoginItemKind, path: PathBuf, identifier: String, product_name: String) -> Self {
        Self {
            kind,
            path,
            identifier,
            product_name,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_file()
    }

    /// Registers or removes the item. Returns the state actually in effect.
    pub fn set_enabled(&self, enable: bool, exe: &Path) -> Result<bool, String> {
        if enable {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            let body = self.kind.render(&self.identifier, &self.product_name, exe);
            io_atomic::write_atomic(&self.path, body.as_bytes()).map_err(|e| e.to_string())?;
        } else {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        Ok(self.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_entry_points_at_executable() {
        let body = LoginItemKind::XdgDesktop.render("app.jotter", "Jotter", Path::new("/opt/jotter/jotter"));
        assert!(body.starts_with("[Desktop Entry]\n"));
        assert!(body.contains("Exec=\"/opt/jotter/jotter\"\n"));
        assert!(body.contains("Name=Jotter\n"));
    }

    #[test]
    fn launch_agent_runs_at_load() {
        let body = LoginItemKind::LaunchAgent.render("app.jotter", "Jotter", Path::new("/Applications/Jotter.app"));
        assert!(body.contains("<string>app.jotter</string>"));
        assert!(body.contains("<key>RunAtLoad</key>\n  <true/>"));
    }

    #[test]
    fn file_names_follow_platform_convention() {
        assert_eq!(LoginItemKind::XdgDesktop.file_name("app.jotter", "Jotter"), "app.jotter.desktop");
        assert_eq!(LoginItemKind::LaunchAgent.file_name("app.jotter", "Jotter"), "app.jotter.plist");
        assert_eq!(LoginItemKind::StartupScript.file_name("app.jotter", "Jotter"), "Jotter.cmd");
    }

    #[test]
    fn toggling_writes_and_removes_the_item() {
        let dir = tempfile::tempdir().unwrap();
        let item = LoginItem::new(
            LoginItemKind::XdgDesktop,
            dir.path().join("autostart").join("app.jotter.desktop"),
            "app.jotter".into(),
            "Jotter".into(),
        );
        assert!(!item.is_enabled());
        assert!(item.set_enabled(true, Path::new("/usr/bin/jotter")).unwrap());
        assert!(item.is_enabled());
        assert!(!item.set_enabled(false, Path::new("/usr/bin/jotter")).unwrap());
        assert!(!item.set_enabled(false, Path::new("/usr/bin/jotter")).unwrap());
    }
}
