//! Removal of one file's contribution.

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::{FileId, QualifiedNameId};

use super::enter::Owner;
use super::symbol::ClassId;
use super::SymbolGraph;

/// What a retraction changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetractStats {
    /// Classes removed outright.
    pub classes_removed: usize,
    /// Classes that lost one contribution but are still declared elsewhere.
    pub classes_trimmed: usize,
    /// Packages pruned because they became childless.
    pub packages_removed: usize,
}

impl SymbolGraph {
    /// Removes every contribution `file` made.
    ///
    /// Classes declared only by `file` disappear, shared classes fall back to their
    /// remaining contributions, and packages left without classes, subpackages or
    /// declaring files are pruned up to (not including) the root.
    pub fn retract_file(&mut self, file: FileId) -> RetractStats {
        let mut stats = RetractStats::default();
        let ids = self.by_file.remove(&file).unwrap_or_default();
        let claimed = self.claims.remove(&file).unwrap_or_default();
        if ids.is_empty() && claimed.is_empty() {
            return stats;
        }

        for package in &claimed {
            if let Some(pkg) = self.packages.get_mut(package) {
                pkg.files.remove(&file);
            }
        }
        let mut touched_packages = claimed;
        let mut removed = BTreeSet::new();
        let mut class_owners = BTreeSet::new();

        for id in ids {
            let Some(symbol) = self.slot_mut(id) else {
                continue;
            };
            let old_supers = symbol.supers().to_vec();
            let Some(contribution) = symbol.take_contribution(file) else {
                continue;
            };
            match contribution.owner {
                Owner::Package(package) => {
                    touched_packages.insert(package);
                }
                Owner::Class(class) => {
                    class_owners.insert(class);
                }
            }

            if symbol.contributions.is_empty() {
                let qualified_name = symbol.qualified_name;
                self.slots[id.0 as usize] = None;
                self.free.push(id);
                self.by_name.remove(&qualified_name);
                self.index_supers(id, &old_supers, &[]);
                if let Owner::Package(package) = contribution.owner {
                    if let Some(pkg) = self.packages.get_mut(&package) {
                        pkg.classes.retain(|_, linked| *linked != id);
                    }
                }
                removed.insert(id);
                stats.classes_removed += 1;
            } else {
                symbol.rebuild_members();
                let new_supers = symbol.supers().to_vec();
                self.index_supers(id, &old_supers, &new_supers);
                self.unlink_stale_owner(id, contribution.owner);
                stats.classes_trimmed += 1;
            }
        }

        if !removed.is_empty() {
            self.scrub_members(&class_owners, &removed);
        }
        for package in touched_packages {
            stats.packages_removed += self.prune_package(package);
        }

        debug!(
            file = file.0,
            removed = stats.classes_removed,
            trimmed = stats.classes_trimmed,
            packages = stats.packages_removed,
            "graph.retract_file"
        );
        stats
    }

    /// Drops removed classes from the member lists of surviving owners.
    fn scrub_members(&mut self, owners: &BTreeSet<QualifiedNameId>, removed: &BTreeSet<ClassId>) {
        for owner in owners {
            let Some(id) = self.class_id(*owner) else {
                continue;
            };
            let Some(symbol) = self.slot_mut(id) else {
                continue;
            };
            for contribution in symbol.contributions.iter_mut() {
                contribution.members.retain(|member| !removed.contains(member));
            }
            symbol.rebuild_members();
        }
    }

    /// Removes `package` and its ancestors while they are childless.
    fn prune_package(&mut self, mut package: QualifiedNameId) -> usize {
        let mut pruned = 0;
        while !package.is_empty() {
            let Some(pkg) = self.packages.get(&package) else {
                break;
            };
            if !pkg.is_prunable() {
                break;
            }
            let parent = pkg.parent.unwrap_or(QualifiedNameId::EMPTY);
            self.packages.remove(&package);
            if let Some(parent_pkg) = self.packages.get_mut(&parent) {
                parent_pkg.subpackages.remove(&package);
            }
            pruned += 1;
            package = parent;
        }
        pruned
    }
}
