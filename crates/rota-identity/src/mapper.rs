//! Alias map: snapshot resolution and deferred store sync.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use rota_clean::strip_embedded_dates;
use rota_model::{Dataset, NAME_JOIN, Result};

use crate::store::{AliasRow, AliasStore};

/// The pair a name resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonIdentity {
    pub person_id: String,
    pub display_name: String,
}

/// Tie-break used when an alias row looks like its alias and display
/// name were swapped (both carry date-like substrings).
///
/// `PreferLonger` keeps the longer string as the display name. This is
/// an unverified heuristic inherited from field data; override with
/// `KeepOriginal` to disable the repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwapRepairPolicy {
    #[default]
    PreferLonger,
    KeepOriginal,
}

impl SwapRepairPolicy {
    fn choose_display(self, alias: &str, display: &str) -> String {
        match self {
            Self::KeepOriginal => display.to_string(),
            Self::PreferLonger => {
                let alias_name = rota_clean::clean_name(alias);
                let display_name = rota_clean::clean_name(display);
                if display_name.chars().count() >= alias_name.chars().count() {
                    display_name
                } else {
                    alias_name
                }
            }
        }
    }
}

fn has_embedded_date(value: &str) -> bool {
    strip_embedded_dates(value) != value
}

/// Name → stable identity resolution over a fixed snapshot.
///
/// The map is loaded at run start and never mutated mid-resolution;
/// names discovered during a run are merged back to the external store
/// only by [`AliasMapper::sync`], after the canonical dataset is
/// produced.
#[derive(Debug, Default)]
pub struct AliasMapper {
    map: BTreeMap<String, PersonIdentity>,
    swap_policy: SwapRepairPolicy,
}

impl AliasMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the swapped-pair repair tie-break.
    #[must_use]
    pub fn with_swap_policy(mut self, policy: SwapRepairPolicy) -> Self {
        self.swap_policy = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Normalized form of a name used as the alias key: whitespace
    /// removed (full-width included), embedded date-like substrings
    /// stripped to a fixpoint, lower-cased. Idempotent.
    pub fn normalize_for_matching(name: &str) -> String {
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        strip_embedded_dates(&compact).to_lowercase()
    }

    /// Registers one alias. The first person_id registered for a
    /// normalized key wins; later conflicts are logged and dropped.
    pub fn insert(&mut self, alias: &str, person_id: &str, display_name: &str) {
        let key = Self::normalize_for_matching(alias);
        if key.is_empty() || person_id.trim().is_empty() {
            return;
        }
        let display = self.swap_policy_display(alias, display_name);
        match self.map.get(&key) {
            Some(existing) if existing.person_id != person_id => {
                warn!(
                    alias = %alias,
                    kept = %existing.person_id,
                    dropped = %person_id,
                    "alias key already bound to another person"
                );
            }
            Some(_) => {}
            None => {
                self.map.insert(
                    key,
                    PersonIdentity {
                        person_id: person_id.trim().to_string(),
                        display_name: display,
                    },
                );
            }
        }
    }

    fn swap_policy_display(&self, alias: &str, display_name: &str) -> String {
        let alias = alias.trim();
        let display = display_name.trim();
        if has_embedded_date(alias) && has_embedded_date(display) {
            self.swap_policy.choose_display(alias, display)
        } else {
            display.to_string()
        }
    }

    /// Populates the map from a table carrying a case-insensitive
    /// {alias, person_id, display_name} header triple. Rows missing any
    /// of the three after trim are skipped silently.
    pub fn load(&mut self, table: &Dataset) {
        let column = |name: &str| {
            table
                .columns
                .iter()
                .position(|c| c.trim().eq_ignore_ascii_case(name))
        };
        let (Some(alias_idx), Some(id_idx), Some(display_idx)) = (
            column("alias"),
            column("person_id"),
            column("display_name"),
        ) else {
            debug!("alias table missing header triple, nothing loaded");
            return;
        };
        for row in &table.rows {
            let alias = row.get(alias_idx).map_or("", |s| s.trim());
            let person_id = row.get(id_idx).map_or("", |s| s.trim());
            let display = row.get(display_idx).map_or("", |s| s.trim());
            if alias.is_empty() || person_id.is_empty() || display.is_empty() {
                continue;
            }
            self.insert(alias, person_id, display);
        }
    }

    /// Populates the map from the external store's rows.
    pub fn load_rows(&mut self, rows: &[AliasRow]) {
        for row in rows {
            let alias = row.alias.trim();
            let person_id = row.person_id.trim();
            let display = row.display_name.trim();
            if alias.is_empty() || person_id.is_empty() || display.is_empty() {
                continue;
            }
            self.insert(alias, person_id, display);
        }
    }

    /// Deterministic identity for an unknown normalized key.
    pub fn synthesize_id(normalized_key: &str) -> String {
        format!("person_{normalized_key}")
    }

    /// Resolves a name against the snapshot. Total: empty or
    /// all-whitespace input yields the empty identity. Unknown names
    /// synthesize `person_ + normalized_key` with the trimmed original
    /// as display name; identical raw spellings always synthesize the
    /// identical id against the same map state.
    pub fn resolve(&self, name: &str) -> PersonIdentity {
        let key = Self::normalize_for_matching(name);
        if key.is_empty() {
            return PersonIdentity::default();
        }
        match self.map.get(&key) {
            Some(identity) => identity.clone(),
            None => PersonIdentity {
                person_id: Self::synthesize_id(&key),
                display_name: name.trim().to_string(),
            },
        }
    }

    /// Parallel resolution of several names, skipping names whose
    /// resolution yields an empty identity.
    pub fn resolve_list(&self, names: &[String]) -> (Vec<String>, Vec<String>) {
        let mut ids = Vec::with_capacity(names.len());
        let mut displays = Vec::with_capacity(names.len());
        for name in names {
            let identity = self.resolve(name);
            if identity.person_id.is_empty() {
                continue;
            }
            ids.push(identity.person_id);
            displays.push(identity.display_name);
        }
        (ids, displays)
    }

    /// Tallies `{role}_name` values across a canonical dataset.
    /// Multi-person cells are split on the display-name separator.
    pub fn extract_names(dataset: &Dataset, role_fields: &[String]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for role in role_fields {
            let column = format!("{role}_name");
            let Some(idx) = dataset.column_index(&column) else {
                continue;
            };
            for row in &dataset.rows {
                let Some(cell) = row.get(idx) else { continue };
                for name in cell.split(NAME_JOIN) {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    *counts.entry(name.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Partitions tallied names by normalized-key membership in the
    /// current map.
    pub fn detect_new_and_existing(
        &self,
        counts: &BTreeMap<String, usize>,
    ) -> (Vec<String>, Vec<String>) {
        let mut new = Vec::new();
        let mut existing = Vec::new();
        for name in counts.keys() {
            let key = Self::normalize_for_matching(name);
            if key.is_empty() {
                continue;
            }
            if self.map.contains_key(&key) {
                existing.push(name.clone());
            } else {
                new.push(name.clone());
            }
        }
        (new, existing)
    }

    /// Merges tallied names back into the external store: counts of
    /// existing normalized entries are bumped in place, new names are
    /// appended with a synthesized id, and the whole table is written
    /// back in one replace. All-or-nothing from the caller's view.
    pub fn sync(
        &self,
        store: &mut dyn AliasStore,
        counts: &BTreeMap<String, usize>,
    ) -> Result<SyncOutcome> {
        let mut rows = store.read_all()?;
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let key = Self::normalize_for_matching(&row.alias);
            if !key.is_empty() {
                index.entry(key).or_insert(idx);
            }
        }
        let mut outcome = SyncOutcome::default();
        for (name, count) in counts {
            let key = Self::normalize_for_matching(name);
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&idx) => {
                    rows[idx].count += count;
                    outcome.updated += 1;
                }
                None => {
                    rows.push(AliasRow {
                        alias: name.clone(),
                        person_id: Self::synthesize_id(&key),
                        display_name: name.clone(),
                        count: *count,
                    });
                    index.insert(key, rows.len() - 1);
                    outcome.appended += 1;
                }
            }
        }
        store.write_all(&rows)?;
        debug!(
            updated = outcome.updated,
            appended = outcome.appended,
            "alias table synced"
        );
        Ok(outcome)
    }
}

/// Counts from one [`AliasMapper::sync`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub updated: usize,
    pub appended: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_with_zhang() -> AliasMapper {
        let mut mapper = AliasMapper::new();
        mapper.insert("zhangmushi", "preacher_zhang", "张牧师");
        mapper.insert("张牧师", "preacher_zhang", "张牧师");
        mapper
    }

    #[test]
    fn normalize_is_idempotent_and_insensitive() {
        assert_eq!(
            AliasMapper::normalize_for_matching("  Zhang "),
            AliasMapper::normalize_for_matching("zhang")
        );
        for raw in ["  Zhang ", "张 牧 师", "张牧师2025-10-05", "李四\u{3000}"] {
            let once = AliasMapper::normalize_for_matching(raw);
            assert_eq!(
                AliasMapper::normalize_for_matching(&once),
                once,
                "input: {raw:?}"
            );
        }
    }

    #[test]
    fn resolve_is_total() {
        let mapper = AliasMapper::new();
        assert_eq!(mapper.resolve(""), PersonIdentity::default());
        assert_eq!(mapper.resolve("   "), PersonIdentity::default());
    }

    #[test]
    fn resolve_known_alias_ignores_whitespace() {
        let mapper = mapper_with_zhang();
        for raw in ["张牧师", "  张牧师 "] {
            let identity = mapper.resolve(raw);
            assert_eq!(identity.person_id, "preacher_zhang");
            assert_eq!(identity.display_name, "张牧师");
        }
    }

    #[test]
    fn unknown_name_synthesizes_deterministically() {
        let mapper = mapper_with_zhang();
        let first = mapper.resolve("李四");
        let second = mapper.resolve("李四");
        assert_eq!(first, second);
        assert_eq!(first.person_id, "person_李四");
        assert_eq!(first.display_name, "李四");
    }

    #[test]
    fn resolve_list_skips_empty_identities() {
        let mapper = mapper_with_zhang();
        let names = vec![
            "张牧师".to_string(),
            "".to_string(),
            "李四".to_string(),
        ];
        let (ids, displays) = mapper.resolve_list(&names);
        assert_eq!(ids, vec!["preacher_zhang", "person_李四"]);
        assert_eq!(displays, vec!["张牧师", "李四"]);
    }

    #[test]
    fn first_binding_wins_for_a_key() {
        let mut mapper = AliasMapper::new();
        mapper.insert("张牧师", "preacher_zhang", "张牧师");
        mapper.insert("张牧师", "someone_else", "张牧师");
        assert_eq!(mapper.resolve("张牧师").person_id, "preacher_zhang");
    }

    #[test]
    fn load_requires_header_triple() {
        let mut mapper = AliasMapper::new();
        mapper.load(&Dataset {
            columns: vec!["Alias".to_string(), "PERSON_ID".to_string(), "display_name".to_string()],
            rows: vec![
                vec!["张牧师".to_string(), "preacher_zhang".to_string(), "张牧师".to_string()],
                vec!["李四".to_string(), String::new(), "李四".to_string()],
            ],
        });
        assert_eq!(mapper.len(), 1);
        assert_eq!(mapper.resolve("张牧师").person_id, "preacher_zhang");

        let mut empty = AliasMapper::new();
        empty.load(&Dataset {
            columns: vec!["name".to_string()],
            rows: vec![vec!["张牧师".to_string()]],
        });
        assert!(empty.is_empty());
    }

    #[test]
    fn swap_repair_prefers_longer_display() {
        let mut mapper = AliasMapper::new();
        mapper.insert("张2025-10-05", "preacher_zhang", "张牧师10月5日");
        let identity = mapper.resolve("张");
        assert_eq!(identity.person_id, "preacher_zhang");
        assert_eq!(identity.display_name, "张牧师");
    }

    #[test]
    fn swap_repair_can_be_disabled() {
        let mut mapper = AliasMapper::new().with_swap_policy(SwapRepairPolicy::KeepOriginal);
        mapper.insert("张2025-10-05", "preacher_zhang", "张牧师10月5日");
        assert_eq!(mapper.resolve("张").display_name, "张牧师10月5日");
    }
}
