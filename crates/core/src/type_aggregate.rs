//! Flattened member view of a class-like symbol and everything it extends,
//! implements or uses.

use phpscope_api::models::{Symbol, SymbolKind};
use phpscope_api::{MemberMergeStrategy, type_string};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Resolves a fully-qualified class-like name to its declarations.
pub trait ClassLookup {
    fn class_like(&self, fqn: &str) -> Vec<Arc<Symbol>>;
}

pub struct TypeAggregate<'a, L: ClassLookup + ?Sized> {
    lookup: &'a L,
    symbol: Arc<Symbol>,
    associated: OnceCell<Vec<Arc<Symbol>>>,
}

impl<'a, L: ClassLookup + ?Sized> TypeAggregate<'a, L> {
    pub fn new(lookup: &'a L, symbol: Arc<Symbol>) -> Self {
        Self {
            lookup,
            symbol,
            associated: OnceCell::new(),
        }
    }

    /// Aggregate over the class-like declaration named `fqn`. When the name is
    /// declared more than once, the first declaration wins and the others take
    /// no part in the view.
    pub fn create(lookup: &'a L, fqn: &str) -> Option<Self> {
        lookup
            .class_like(fqn)
            .into_iter()
            .next()
            .map(|symbol| Self::new(lookup, symbol))
    }

    pub fn name(&self) -> &str {
        &self.symbol.name
    }

    pub fn symbol(&self) -> &Arc<Symbol> {
        &self.symbol
    }

    /// Transitive bases and interfaces breadth first, then used traits.
    /// Excludes the root itself.
    pub fn associated(&self) -> &[Arc<Symbol>] {
        self.associated.get_or_init(|| self.collect_associated())
    }

    fn collect_associated(&self) -> Vec<Arc<Symbol>> {
        let mut visited = HashSet::new();
        visited.insert(self.symbol.name.to_lowercase());

        let mut types = Vec::new();
        let mut traits = Vec::new();
        let mut queue: VecDeque<Arc<Symbol>> = VecDeque::from([self.symbol.clone()]);

        while let Some(current) = queue.pop_front() {
            for base in &current.associated {
                if !visited.insert(base.name.to_lowercase()) {
                    continue;
                }
                for found in self.lookup.class_like(&base.name) {
                    if found.kind == SymbolKind::Trait {
                        traits.push(found.clone());
                    } else {
                        types.push(found.clone());
                    }
                    queue.push_back(found);
                }
            }
        }

        types.extend(traits);
        types
    }

    /// Members matching `predicate` across the aggregate, reconciled by
    /// `strategy`. `$this` and `static` types are rewritten to the aggregate
    /// name.
    pub fn members<P>(&self, strategy: MemberMergeStrategy, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        let root = std::iter::once((&self.symbol, true));
        let inherited = self.associated().iter().map(|s| (s, false));

        let candidates = root.chain(inherited).flat_map(|(owner, is_root)| {
            owner
                .children
                .iter()
                .filter(move |m| m.is_member() && (is_root || !m.is_private()))
        });

        let mut merged: Vec<Arc<Symbol>> = Vec::new();
        let mut slots: HashMap<(SymbolKind, String), usize> = HashMap::new();

        for member in candidates.filter(|m| predicate(m)) {
            if strategy == MemberMergeStrategy::None {
                merged.push(member.clone());
                continue;
            }
            let key = member_key(member);
            let Some(&slot) = slots.get(&key) else {
                slots.insert(key, merged.len());
                merged.push(member.clone());
                continue;
            };
            let replace = match strategy {
                MemberMergeStrategy::Base => true,
                MemberMergeStrategy::Documented => {
                    let current = &merged[slot];
                    (!current.has_doc() || current.doc_has_inherit())
                        && member.has_doc()
                        && !member.doc_has_inherit()
                }
                _ => false,
            };
            if replace {
                merged[slot] = member.clone();
            }
        }

        merged
            .into_iter()
            .map(|m| resolve_self_type(m, &self.symbol.name))
            .collect()
    }

    /// Members of `kind` named `name`, compared the way PHP compares that kind.
    pub fn named_members(
        &self,
        strategy: MemberMergeStrategy,
        kind: SymbolKind,
        name: &str,
    ) -> Vec<Arc<Symbol>> {
        self.members(strategy, |m| m.kind == kind && m.name_equals(name))
    }
}

fn member_key(member: &Symbol) -> (SymbolKind, String) {
    let name = if member.kind.is_case_sensitive() {
        member.name.clone()
    } else {
        member.name.to_lowercase()
    };
    (member.kind, name)
}

fn resolve_self_type(member: Arc<Symbol>, fqn: &str) -> Arc<Symbol> {
    let resolved = type_string::resolve_this_or_static(&member.type_, fqn);
    if resolved == member.type_ {
        return member;
    }
    let mut copy = (*member).clone();
    copy.type_ = resolved;
    Arc::new(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpscope_api::models::{PhpDocInfo, SymbolIdentifier, SymbolModifiers};

    struct Classes(Vec<Arc<Symbol>>);

    impl ClassLookup for Classes {
        fn class_like(&self, fqn: &str) -> Vec<Arc<Symbol>> {
            self.0
                .iter()
                .filter(|s| s.name.eq_ignore_ascii_case(fqn))
                .cloned()
                .collect()
        }
    }

    fn class(kind: SymbolKind, name: &str, bases: &[(SymbolKind, &str)], members: Vec<Symbol>) -> Arc<Symbol> {
        let mut s = Symbol::new(kind, name);
        s.associated = bases
            .iter()
            .map(|(k, n)| SymbolIdentifier::new(*k, *n))
            .collect();
        s.children = members.into_iter().map(Arc::new).collect();
        Arc::new(s)
    }

    fn method(name: &str, owner: &str, modifiers: SymbolModifiers, ty: &str) -> Symbol {
        let mut m = Symbol::new(SymbolKind::Method, name);
        m.modifiers = modifiers;
        m.scope = Some(owner.to_string());
        m.type_ = ty.to_string();
        m
    }

    fn documented(mut m: Symbol, text: &str) -> Symbol {
        m.doc = Some(PhpDocInfo {
            description: text.to_string(),
            type_: String::new(),
        });
        m
    }

    #[test]
    fn cyclic_bases_terminate() {
        let a = class(SymbolKind::Class, "A", &[(SymbolKind::Class, "B")], vec![]);
        let b = class(SymbolKind::Class, "B", &[(SymbolKind::Class, "A")], vec![]);
        let lookup = Classes(vec![a, b]);
        let agg = TypeAggregate::create(&lookup, "A").unwrap();
        let names: Vec<_> = agg.associated().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn first_of_duplicate_declarations_wins() {
        let first = class(
            SymbolKind::Class,
            "A",
            &[],
            vec![method("one", "A", SymbolModifiers::PUBLIC, "")],
        );
        let second = class(
            SymbolKind::Class,
            "A",
            &[],
            vec![method("two", "A", SymbolModifiers::PUBLIC, "")],
        );
        let lookup = Classes(vec![first.clone(), second]);
        let agg = TypeAggregate::create(&lookup, "A").unwrap();
        assert!(Arc::ptr_eq(agg.symbol(), &first));
        let names: Vec<_> = agg
            .members(MemberMergeStrategy::None, |_| true)
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["one"]);
    }

    #[test]
    fn traits_come_after_classes_and_interfaces() {
        let c = class(
            SymbolKind::Class,
            "C",
            &[
                (SymbolKind::Trait, "T"),
                (SymbolKind::Class, "P"),
                (SymbolKind::Interface, "I"),
            ],
            vec![],
        );
        let lookup = Classes(vec![
            c,
            class(SymbolKind::Trait, "T", &[], vec![]),
            class(SymbolKind::Class, "P", &[], vec![]),
            class(SymbolKind::Interface, "I", &[], vec![]),
        ]);
        let agg = TypeAggregate::create(&lookup, "C").unwrap();
        let names: Vec<_> = agg.associated().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["P", "I", "T"]);
    }

    #[test]
    fn strategies_pick_expected_declaration() {
        let base = class(
            SymbolKind::Class,
            "Base",
            &[],
            vec![documented(
                method("run", "Base", SymbolModifiers::PUBLIC, "int"),
                "Runs.",
            )],
        );
        let child = class(
            SymbolKind::Class,
            "Child",
            &[(SymbolKind::Class, "Base")],
            vec![method("RUN", "Child", SymbolModifiers::PUBLIC, "int")],
        );
        let lookup = Classes(vec![base, child]);
        let agg = TypeAggregate::create(&lookup, "Child").unwrap();
        let scope_of = |s: MemberMergeStrategy| {
            agg.named_members(s, SymbolKind::Method, "run")
                .iter()
                .map(|m| m.scope.clone().unwrap_or_default())
                .collect::<Vec<_>>()
        };
        assert_eq!(scope_of(MemberMergeStrategy::None), vec!["Child", "Base"]);
        assert_eq!(scope_of(MemberMergeStrategy::Override), vec!["Child"]);
        assert_eq!(scope_of(MemberMergeStrategy::Documented), vec!["Base"]);
        assert_eq!(scope_of(MemberMergeStrategy::Base), vec!["Base"]);
    }

    #[test]
    fn private_base_members_are_hidden_and_static_types_rebound() {
        let base = class(
            SymbolKind::Class,
            "Base",
            &[],
            vec![
                method("secret", "Base", SymbolModifiers::PRIVATE, "int"),
                method("make", "Base", SymbolModifiers::PUBLIC | SymbolModifiers::STATIC, "static"),
            ],
        );
        let child = class(
            SymbolKind::Class,
            "Child",
            &[(SymbolKind::Class, "Base")],
            vec![method("own", "Child", SymbolModifiers::PRIVATE, "$this")],
        );
        let lookup = Classes(vec![base, child]);
        let agg = TypeAggregate::create(&lookup, "Child").unwrap();
        let members = agg.members(MemberMergeStrategy::Override, |_| true);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["own", "make"]);
        assert!(members.iter().all(|m| m.type_ == "Child"));
    }
}
