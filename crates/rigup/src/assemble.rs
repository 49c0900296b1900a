//! Assembles `.zshrc` from layered fragments and renders the git files.

use crate::assets::FragmentStore;
use crate::platform::Platform;

/// Output sections in emission order. Fixed regardless of discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Config,
    Exports,
    Prompts,
    Aliases,
    Plugins,
}

/// One assembled `.zshrc` buffer plus what went into it.
#[derive(Debug, Default)]
pub struct ZshrcBuild {
    pub content: Vec<u8>,
    /// Fragment paths in emission order.
    pub included: Vec<String>,
    pub warnings: Vec<String>,
}

/// Build the `.zshrc` byte buffer for the given platform and package set.
///
/// The scan pass walks common → OS → OS+arch and buckets loose `.zsh` files
/// by filename keyword. Export and plugin fragments are looked up per
/// package, most specific location first. Identical inputs produce identical
/// bytes.
pub fn build_zshrc(
    store: &dyn FragmentStore,
    platform: &Platform,
    packages: &[String],
) -> ZshrcBuild {
    let mut config = Vec::new();
    let mut prompts = Vec::new();
    let mut aliases = Vec::new();

    for root in platform.scan_roots() {
        let mut names = store.list(&root);
        names.sort();
        for name in names {
            if !name.ends_with(".zsh") {
                continue;
            }
            let path = format!("{root}/{name}");
            if name.contains("config") {
                config.push(path);
            } else if name.contains("prompt") {
                prompts.push(path);
            } else if name.contains("aliases") {
                aliases.push(path);
            }
        }
    }

    let mut pkgs: Vec<String> = packages.to_vec();
    pkgs.sort();
    pkgs.dedup();

    let roots = platform.search_roots();
    let exports = resolve_fragments(store, &roots, "exports", &pkgs);
    let plugins = resolve_fragments(store, &roots, "plugins", &pkgs);

    let mut build = ZshrcBuild::default();
    append_section(store, &config, Section::Config, platform, &mut build);
    append_section(store, &exports, Section::Exports, platform, &mut build);
    append_section(store, &prompts, Section::Prompts, platform, &mut build);
    append_section(store, &aliases, Section::Aliases, platform, &mut build);
    append_section(store, &plugins, Section::Plugins, platform, &mut build);
    build
}

/// First existing `<root>/<category>/<package>.zsh`, searching roots in order.
fn resolve_fragment(
    store: &dyn FragmentStore,
    roots: &[String],
    category: &str,
    package: &str,
) -> Option<String> {
    roots
        .iter()
        .map(|root| format!("{root}/{category}/{package}.zsh"))
        .find(|path| store.contains(path))
}

fn resolve_fragments(
    store: &dyn FragmentStore,
    roots: &[String],
    category: &str,
    packages: &[String],
) -> Vec<String> {
    packages
        .iter()
        .filter_map(|pkg| resolve_fragment(store, roots, category, pkg))
        .collect()
}

fn append_section(
    store: &dyn FragmentStore,
    files: &[String],
    section: Section,
    platform: &Platform,
    build: &mut ZshrcBuild,
) {
    // Read up front so an unreadable fragment does not shift the
    // no-separator-after-last rule for the plugins section.
    let mut readable = Vec::new();
    for path in files {
        match store.read(path) {
            Some(data) => readable.push((path.clone(), data)),
            None => build.warnings.push(format!("could not read fragment {path}")),
        }
    }

    let mut header_written = false;
    let last = readable.len().saturating_sub(1);
    for (i, (path, data)) in readable.into_iter().enumerate() {
        if !header_written {
            match section {
                Section::Exports => {
                    build.content.extend_from_slice(section_header("Exports").as_bytes());
                }
                Section::Plugins => {
                    let title = format!("Plugins ({}:{})", platform.display_os(), platform.arch);
                    build.content.extend_from_slice(section_header(&title).as_bytes());
                }
                _ => {}
            }
            header_written = true;
        }
        build.content.extend_from_slice(&data);
        if section != Section::Plugins || i < last {
            build.content.push(b'\n');
        }
        build.included.push(path);
    }
}

fn section_header(title: &str) -> String {
    format!(
        "# =====================================\n# {title}\n# =====================================\n\n"
    )
}

/// Locate the platform `.zprofile` fragment, most specific path first.
///
/// Returns the fragment path and its bytes, or `None` when the platform has
/// no `.zprofile` (reported to the caller as skipped, not an error).
pub fn find_zprofile(store: &dyn FragmentStore, platform: &Platform) -> Option<(String, Vec<u8>)> {
    let candidates = [
        format!(
            "zsh/{}/{}/.zprofile",
            platform.os_folder(),
            platform.arch_folder()
        ),
        format!("zsh/{}/.zprofile", platform.os_folder()),
    ];
    candidates
        .into_iter()
        .find_map(|path| store.read(&path).map(|data| (path, data)))
}

/// Git identity captured by the wizard.
#[derive(Debug, Clone, Default)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
    pub branch: String,
}

/// Render `.gitconfig`. Plain string formatting — the file is small and
/// fixed-shape enough that a template engine would be overkill.
pub fn render_gitconfig(identity: &GitIdentity, gh_credential_helper: bool) -> String {
    let mut out = format!(
        "[init]\n    defaultBranch = {branch}\n[user]\n    name = {name}\n    email = {email}\n[core]\n    excludesfile = ~/.gitignore\n\n[http]\n    postBuffer = 10485760\n",
        branch = identity.branch,
        name = identity.name,
        email = identity.email,
    );
    if gh_credential_helper {
        out.push_str(
            "\n[credential \"https://github.com\"]\n    helper = !gh auth git-credential\n[credential \"https://gist.github.com\"]\n    helper = !gh auth git-credential\n",
        );
    }
    out
}

/// The bundled `.gitignore`, copied verbatim.
pub fn bundled_gitignore(store: &dyn FragmentStore) -> Option<Vec<u8>> {
    store.read("git/.gitignore")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::MemoryStore;
    use crate::platform::HostOs;

    fn linux() -> Platform {
        Platform::new(HostOs::Linux, "x86_64", false)
    }

    fn store_with_everything() -> MemoryStore {
        MemoryStore::with(&[
            ("zsh/common/config.zsh", "setopt AUTO_CD\n"),
            ("zsh/common/prompt.zsh", "PROMPT='%~ '\n"),
            ("zsh/common/aliases.zsh", "alias ll='ls -l'\n"),
            ("zsh/common/exports/go.zsh", "export GOPATH=~/go\n"),
            ("zsh/common/plugins/fzf.zsh", "source <(fzf --zsh)\n"),
        ])
    }

    #[test]
    fn sections_come_out_in_fixed_order() {
        let store = store_with_everything();
        let build = build_zshrc(
            &store,
            &linux(),
            &["fzf".to_string(), "go".to_string()],
        );
        let text = String::from_utf8(build.content).unwrap();

        let config_at = text.find("AUTO_CD").unwrap();
        let exports_at = text.find("GOPATH").unwrap();
        let prompt_at = text.find("PROMPT").unwrap();
        let aliases_at = text.find("alias ll").unwrap();
        let plugins_at = text.find("fzf --zsh").unwrap();
        assert!(config_at < exports_at);
        assert!(exports_at < prompt_at);
        assert!(prompt_at < aliases_at);
        assert!(aliases_at < plugins_at);
    }

    #[test]
    fn headers_only_for_exports_and_plugins() {
        let store = store_with_everything();
        let build = build_zshrc(&store, &linux(), &["fzf".to_string(), "go".to_string()]);
        let text = String::from_utf8(build.content).unwrap();

        assert!(text.contains("# Exports\n"));
        assert!(text.contains("# Plugins (Linux:x86_64)\n"));
        assert_eq!(text.matches("# =====================================").count(), 4);
    }

    #[test]
    fn no_plugins_header_without_plugin_fragments() {
        let store = store_with_everything();
        let build = build_zshrc(&store, &linux(), &["go".to_string()]);
        let text = String::from_utf8(build.content).unwrap();
        assert!(!text.contains("# Plugins"));
        assert!(text.contains("# Exports"));
    }

    #[test]
    fn no_trailing_newline_after_last_plugin() {
        let store = MemoryStore::with(&[
            ("zsh/common/plugins/fzf.zsh", "plugin-a"),
            ("zsh/common/plugins/zz.zsh", "plugin-b"),
        ]);
        let build = build_zshrc(
            &store,
            &linux(),
            &["zz".to_string(), "fzf".to_string()],
        );
        let text = String::from_utf8(build.content).unwrap();
        // sorted package order: fzf before zz, separator between but not after
        assert!(text.ends_with("plugin-a\nplugin-b"));
    }

    #[test]
    fn non_plugin_fragments_get_trailing_newline() {
        let store = MemoryStore::with(&[("zsh/common/config.zsh", "no-newline-here")]);
        let build = build_zshrc(&store, &linux(), &[]);
        assert_eq!(build.content, b"no-newline-here\n");
    }

    #[test]
    fn most_specific_fragment_wins() {
        let store = MemoryStore::with(&[
            ("zsh/common/exports/go.zsh", "common go"),
            ("zsh/linux/exports/go.zsh", "linux go"),
            ("zsh/linux/intel/exports/go.zsh", "intel go"),
            ("zsh/common/exports/nvm.zsh", "common nvm"),
        ]);
        let build = build_zshrc(
            &store,
            &linux(),
            &["go".to_string(), "nvm".to_string()],
        );
        let text = String::from_utf8(build.content).unwrap();
        assert!(text.contains("intel go"));
        assert!(!text.contains("linux go"));
        assert!(!text.contains("common go"));
        // only the common-level fragment exists, so it is used
        assert!(text.contains("common nvm"));
    }

    #[test]
    fn package_contributes_to_both_categories() {
        let store = MemoryStore::with(&[
            ("zsh/common/exports/fzf.zsh", "fzf export"),
            ("zsh/common/plugins/fzf.zsh", "fzf plugin"),
        ]);
        let build = build_zshrc(&store, &linux(), &["fzf".to_string()]);
        let text = String::from_utf8(build.content).unwrap();
        assert!(text.contains("fzf export"));
        assert!(text.contains("fzf plugin"));
    }

    #[test]
    fn packages_are_sorted_and_deduped_before_lookup() {
        let store = MemoryStore::with(&[
            ("zsh/common/exports/aa.zsh", "first"),
            ("zsh/common/exports/zz.zsh", "last"),
        ]);
        let build = build_zshrc(
            &store,
            &linux(),
            &["zz".to_string(), "aa".to_string(), "zz".to_string()],
        );
        let text = String::from_utf8(build.content).unwrap();
        assert!(text.find("first").unwrap() < text.find("last").unwrap());
        assert_eq!(text.matches("last").count(), 1);
        assert_eq!(build.included.len(), 2);
    }

    #[test]
    fn unmatched_filenames_are_ignored_by_scan_pass() {
        let store = MemoryStore::with(&[
            ("zsh/common/config.zsh", "kept"),
            ("zsh/common/random.zsh", "dropped"),
            ("zsh/common/notes.txt", "dropped"),
        ]);
        let build = build_zshrc(&store, &linux(), &[]);
        let text = String::from_utf8(build.content).unwrap();
        assert!(text.contains("kept"));
        assert!(!text.contains("dropped"));
    }

    #[test]
    fn empty_store_builds_empty_buffer() {
        let store = MemoryStore::default();
        let build = build_zshrc(&store, &linux(), &["go".to_string()]);
        assert!(build.content.is_empty());
        assert!(build.included.is_empty());
        assert!(build.warnings.is_empty());
    }

    #[test]
    fn identical_inputs_produce_identical_bytes() {
        let store = store_with_everything();
        let packages = vec!["go".to_string(), "fzf".to_string()];
        let first = build_zshrc(&store, &linux(), &packages);
        let second = build_zshrc(&store, &linux(), &packages);
        assert_eq!(first.content, second.content);
        assert_eq!(first.included, second.included);
    }

    #[test]
    fn zprofile_prefers_arch_specific_path() {
        let store = MemoryStore::with(&[
            ("zsh/macos/.zprofile", "os level"),
            ("zsh/macos/arm/.zprofile", "arch level"),
        ]);
        let platform = Platform::new(HostOs::MacOs, "aarch64", false);
        let (path, data) = find_zprofile(&store, &platform).unwrap();
        assert_eq!(path, "zsh/macos/arm/.zprofile");
        assert_eq!(data, b"arch level");
    }

    #[test]
    fn zprofile_falls_back_to_os_level() {
        let store = MemoryStore::with(&[("zsh/macos/.zprofile", "os level")]);
        let platform = Platform::new(HostOs::MacOs, "x86_64", false);
        let (path, _) = find_zprofile(&store, &platform).unwrap();
        assert_eq!(path, "zsh/macos/.zprofile");
    }

    #[test]
    fn missing_zprofile_is_none() {
        let platform = Platform::new(HostOs::Linux, "x86_64", false);
        assert!(find_zprofile(&MemoryStore::default(), &platform).is_none());
    }

    #[test]
    fn gitconfig_renders_identity() {
        let identity = GitIdentity {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            branch: "main".into(),
        };
        let text = render_gitconfig(&identity, false);
        assert!(text.contains("defaultBranch = main"));
        assert!(text.contains("name = Ada Lovelace"));
        assert!(text.contains("email = ada@example.com"));
        assert!(text.contains("postBuffer = 10485760"));
        assert!(!text.contains("credential"));
    }

    #[test]
    fn gitconfig_adds_credential_helper_when_gh_present() {
        let identity = GitIdentity {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            branch: "main".into(),
        };
        let text = render_gitconfig(&identity, true);
        assert!(text.contains(r#"[credential "https://github.com"]"#));
        assert!(text.contains("!gh auth git-credential"));
    }
}
