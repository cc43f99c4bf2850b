use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="header-container"></div>
<main><section id="hero" class="hero">Loading...</section></main>
<div id="footer-container"></div>
</body>
</html>"#;

const MANIFEST: &str = r##"{
  "modules": [
    {"name": "footer", "path": "modules/footer.html", "target": "#footer-container", "priority": "lazy"},
    {"name": "hero", "path": "modules/hero.html", "target": "section#hero", "priority": "critical", "order": 1},
    {"name": "header", "path": "modules/header.html", "target": "#header-container", "priority": "critical", "order": 0}
  ]
}"##;

/// A scratch site laid out the way `oto` expects by default: a `public/`
/// directory holding the template, the manifest and the fragments.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        site.write("public/index.html", TEMPLATE);
        site.write("public/config/modules.json", MANIFEST);
        site.write("public/modules/header.html", "<nav>OTO</nav>");
        site.write("public/modules/hero.html", "<h1>Transcribe anything</h1>");
        site.write("public/modules/footer.html", "<small>2026</small>");
        site
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(oto_binary());
        cmd.args(args)
            .current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env("HOME", self.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");

        for (key, _) in std::env::vars() {
            if key.starts_with("OTO_") {
                cmd.env_remove(key);
            }
        }
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        cmd.output().expect("Failed to execute oto command")
    }
}

fn oto_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_oto"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = Site::new().run(&["version"]);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout(&output).contains("oto 0.1.0"));
    }

    #[test]
    fn test_version_command_detailed() {
        let output = Site::new().run(&["version", "--detailed"]);
        let out = stdout(&output);

        assert!(output.status.success());
        assert!(out.contains("Version"));
        assert!(out.contains("Apache-2.0"));
    }

    #[test]
    fn test_help_lists_commands() {
        let output = Site::new().run(&["--help"]);
        let out = stdout(&output);

        assert!(output.status.success());
        for command in ["assemble", "modules", "check", "version"] {
            assert!(out.contains(command), "help should mention {}", command);
        }
    }
}

mod assemble_command_tests {
    use super::*;

    #[test]
    fn test_assemble_to_stdout() {
        let output = Site::new().run(&["assemble"]);
        let page = stdout(&output);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(page.contains(r#"<div id="header-container"><nav>OTO</nav></div>"#));
        assert!(page.contains(r#"<section id="hero" class="hero"><h1>Transcribe anything</h1></section>"#));
        assert!(page.contains(r#"<div id="footer-container"><small>2026</small></div>"#));
        assert!(stderr(&output).contains("Page assembled"));
    }

    #[test]
    fn test_assemble_to_file_with_json_summary() {
        let site = Site::new();
        let output = site.run(&["assemble", "--output", "dist.html", "--format", "json"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(summary["success"], true);
        assert_eq!(summary["criticalCount"], 2);
        assert_eq!(summary["lazyCount"], 1);
        assert_eq!(summary["errors"], serde_json::json!([]));

        let page = fs::read_to_string(site.path().join("dist.html")).unwrap();
        assert!(page.contains("<nav>OTO</nav>"));
    }

    #[test]
    fn test_missing_fragment_is_reported_but_not_fatal() {
        let site = Site::new();
        site.remove("public/modules/header.html");

        let output = site.run(&["assemble", "--output", "dist.html", "--format", "json"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(summary["criticalCount"], 1);
        assert_eq!(summary["errors"][0]["module"], "header");
        assert_eq!(
            summary["errors"][0]["error"],
            "Failed to load module \"header\": 404"
        );

        let page = fs::read_to_string(site.path().join("dist.html")).unwrap();
        assert!(page.contains(r#"<div id="header-container"></div>"#));
        assert!(page.contains("<small>2026</small>"));
    }

    #[test]
    fn test_strict_fails_on_module_errors() {
        let site = Site::new();
        site.remove("public/modules/footer.html");

        let output = site.run(&["assemble", "--output", "dist.html", "--strict"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("1 module error(s) recorded"));
        assert!(site.path().join("dist.html").exists());
    }

    #[test]
    fn test_root_flag_and_env_override() {
        let site = Site::new();
        site.write("www/index.html", "<p id=\"slot\"></p>");
        site.write(
            "www/modules.json",
            r##"{"modules":[{"name":"slot","path":"slot.html","target":"#slot","priority":"critical","order":0}]}"##,
        );
        site.write("www/slot.html", "<b>env</b>");

        let output = site.run_with_env(
            &["assemble", "--root", "www"],
            &[("OTO_LOADER__MANIFEST_PATH", "modules.json")],
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("<p id=\"slot\"><b>env</b></p>"));
    }

    #[test]
    fn test_css_combinator_targets() {
        let site = Site::new();
        site.write(
            "public/index.html",
            r#"<main><section data-module="hero"></section></main><div id="a"><span class="x"></span></div>"#,
        );
        site.write(
            "public/config/modules.json",
            r##"{"modules":[
                {"name":"hero","path":"modules/hero.html","target":"main > [data-module=hero]","priority":"critical","order":0},
                {"name":"footer","path":"modules/footer.html","target":"#a .x","priority":"lazy"}
            ]}"##,
        );

        let output = site.run(&["assemble"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            stdout(&output).trim_end(),
            r#"<main><section data-module="hero"><h1>Transcribe anything</h1></section></main><div id="a"><span class="x"><small>2026</small></span></div>"#
        );
    }

    #[test]
    fn test_verbose_logs_resolved_site() {
        let site = Site::new();
        let output = site.run(&["--verbose", "assemble", "--output", "dist.html"]);
        let err = stderr(&output);

        assert!(output.status.success(), "stderr: {}", err);
        assert!(err.contains("Resolved site"));
        assert!(err.contains("Loaded manifest"));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let site = Site::new();
        site.remove("public/config/modules.json");

        let output = site.run(&["assemble"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("config/modules.json"));
    }

    #[test]
    fn test_invalid_config_value_fails() {
        let site = Site::new();
        let output = site.run_with_env(&["assemble"], &[("OTO_BASE_URL", "ftp://oto.example")]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("loader.base_url"));
    }
}

mod modules_command_tests {
    use super::*;

    #[test]
    fn test_modules_lists_load_order() {
        let output = Site::new().run(&["modules"]);
        let out = stdout(&output);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let header = out.find("header").unwrap();
        let hero = out.find("hero").unwrap();
        let footer = out.find("footer").unwrap();
        assert!(header < hero && hero < footer);
        assert!(out.contains("Total: 3 modules (2 critical, 1 lazy)"));
    }

    #[test]
    fn test_modules_json() {
        let output = Site::new().run(&["modules", "--format", "json"]);
        let modules: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

        let names: Vec<&str> = modules
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["header", "hero", "footer"]);
    }
}

mod check_command_tests {
    use super::*;

    #[test]
    fn test_check_valid_manifest() {
        let output = Site::new().run(&["check"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("3 modules, 2 critical, 1 lazy"));
    }

    #[test]
    fn test_check_reports_problems() {
        let site = Site::new();
        site.write(
            "public/config/modules.json",
            r##"{"modules":[
                {"name":"a","path":"a.html","target":"#a","priority":"critical"},
                {"name":"a","path":"","target":"#b","priority":"lazy"}
            ]}"##,
        );

        let output = site.run(&["check"]);
        let out = stdout(&output);

        assert!(!output.status.success());
        assert!(out.contains("critical module has no order"));
        assert!(out.contains("duplicate name \"a\""));
        assert!(out.contains("path is empty"));
        assert!(stderr(&output).contains("Manifest has 3 problem(s)"));
    }

    #[test]
    fn test_check_rejects_unknown_priority() {
        let site = Site::new();
        site.write(
            "public/config/modules.json",
            r##"{"modules":[{"name":"a","path":"a.html","target":"#a","priority":"eager"}]}"##,
        );

        let output = site.run(&["check"]);
        assert!(!output.status.success());
    }
}
