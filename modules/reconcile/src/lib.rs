//! Minimal edit scripts between two ordered server lists, for incremental view updates.

use serde::Serialize;
use servercache_core::ServerRecord;

/// One step of an [`EditScript`]. Positions refer to the list as it stands after
/// every earlier step has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Insert `new[new_index]` at `position`.
    Insert { position: usize, new_index: usize },
    Remove { position: usize },
    /// Take the item at `from` out, then put it back at `to` in the shortened list.
    Move { from: usize, to: usize },
    /// The item at `position` is the same entity but shows different content; rebind it from `new[new_index]`.
    Change { position: usize, new_index: usize },
}

/// Receives the steps of an edit script, e.g. an indexed view.
pub trait ListUpdate {
    fn inserted(&mut self, position: usize, new_index: usize);
    fn removed(&mut self, position: usize);
    fn moved(&mut self, from: usize, to: usize);
    fn changed(&mut self, position: usize, new_index: usize);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditScript {
    edits: Vec<Edit>,
}

impl EditScript {
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn dispatch<U: ListUpdate + ?Sized>(&self, target: &mut U) {
        for edit in &self.edits {
            match *edit {
                Edit::Insert { position, new_index } => target.inserted(position, new_index),
                Edit::Remove { position } => target.removed(position),
                Edit::Move { from, to } => target.moved(from, to),
                Edit::Change { position, new_index } => target.changed(position, new_index),
            }
        }
    }

    /// Applies the script to `list`, which must hold the `old` sequence it was computed from.
    /// Matched items with equal content keep their old value.
    pub fn apply<T: Clone>(&self, list: &mut Vec<T>, new: &[T]) {
        self.dispatch(&mut VecUpdate { list, new });
    }
}

struct VecUpdate<'a, T> {
    list: &'a mut Vec<T>,
    new: &'a [T],
}

impl<T: Clone> ListUpdate for VecUpdate<'_, T> {
    fn inserted(&mut self, position: usize, new_index: usize) {
        self.list.insert(position, self.new[new_index].clone());
    }

    fn removed(&mut self, position: usize) {
        self.list.remove(position);
    }

    fn moved(&mut self, from: usize, to: usize) {
        let item = self.list.remove(from);
        self.list.insert(to, item);
    }

    fn changed(&mut self, position: usize, new_index: usize) {
        self.list[position] = self.new[new_index].clone();
    }
}

/// Identity for list diffing: same host name.
pub fn same_server(a: &ServerRecord, b: &ServerRecord) -> bool {
    a.host_name == b.host_name
}

/// Displayed content: host name, ip address and country. Speed, ping and score are not compared.
pub fn same_listing(a: &ServerRecord, b: &ServerRecord) -> bool {
    a.host_name == b.host_name && a.ip_address == b.ip_address && a.country_long == b.country_long
}

pub fn diff(old: &[ServerRecord], new: &[ServerRecord]) -> EditScript {
    diff_by(old, new, same_server, same_listing)
}

/// Computes the edit script turning `old` into `new`.
///
/// Items are paired along a longest common subsequence under `same_item`. Leftover
/// items that still share an identity are paired left to right as moves; the rest
/// are removed or inserted. Steps come out as removes (back to front), moves,
/// inserts (front to back), then changes for pairs failing `same_content`.
pub fn diff_by<T, I, C>(old: &[T], new: &[T], same_item: I, same_content: C) -> EditScript
where
    I: Fn(&T, &T) -> bool,
    C: Fn(&T, &T) -> bool,
{
    if old.is_empty() {
        let edits = (0..new.len())
            .map(|j| Edit::Insert { position: j, new_index: j })
            .collect();
        return EditScript { edits };
    }

    let (n, m) = (old.len(), new.len());
    let mut old_match: Vec<Option<usize>> = vec![None; n];
    let mut new_match: Vec<Option<usize>> = vec![None; m];
    let mut moved = vec![false; m];

    // lcs[i * w + j] = LCS length of old[i..] and new[j..]
    let w = m + 1;
    let mut lcs = vec![0u32; (n + 1) * w];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * w + j] = if same_item(&old[i], &new[j]) {
                lcs[(i + 1) * w + j + 1] + 1
            } else {
                lcs[(i + 1) * w + j].max(lcs[i * w + j + 1])
            };
        }
    }
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if same_item(&old[i], &new[j]) {
            old_match[i] = Some(j);
            new_match[j] = Some(i);
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * w + j] >= lcs[i * w + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    for j in 0..m {
        if new_match[j].is_some() {
            continue;
        }
        let found = (0..n).find(|&i| old_match[i].is_none() && same_item(&old[i], &new[j]));
        if let Some(i) = found {
            old_match[i] = Some(j);
            new_match[j] = Some(i);
            moved[j] = true;
        }
    }

    let mut edits = Vec::new();

    for i in (0..n).rev() {
        if old_match[i].is_none() {
            edits.push(Edit::Remove { position: i });
        }
    }

    // Working list of new indices for the surviving old items, in current order.
    let mut cur: Vec<usize> = old_match.iter().flatten().copied().collect();
    let mut prev_matched: Option<usize> = None;
    for j in 0..m {
        if new_match[j].is_none() {
            continue;
        }
        if moved[j] {
            let Some(from) = cur.iter().position(|&k| k == j) else { continue };
            cur.remove(from);
            let to = match prev_matched {
                Some(p) => cur.iter().position(|&k| k == p).map_or(0, |pos| pos + 1),
                None => 0,
            };
            cur.insert(to, j);
            if from != to {
                edits.push(Edit::Move { from, to });
            }
        }
        prev_matched = Some(j);
    }

    for j in 0..m {
        if new_match[j].is_none() {
            edits.push(Edit::Insert { position: j, new_index: j });
        }
    }

    for (j, matched) in new_match.iter().enumerate() {
        if let Some(i) = *matched {
            if !same_content(&old[i], &new[j]) {
                edits.push(Edit::Change { position: j, new_index: j });
            }
        }
    }

    EditScript { edits }
}

/// The list a view last rendered. Refreshing it yields the steps to bring the view up to date.
#[derive(Debug, Clone, Default)]
pub struct ServerList {
    servers: Vec<ServerRecord>,
}

impl ServerList {
    pub fn new(servers: Vec<ServerRecord>) -> Self {
        ServerList { servers }
    }

    pub fn servers(&self) -> &[ServerRecord] {
        &self.servers
    }

    /// Diffs against the retained list, then adopts `servers` in full.
    pub fn set_servers(&mut self, servers: Vec<ServerRecord>) -> EditScript {
        let script = diff(&self.servers, &servers);
        self.servers = servers;
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(host: &str, ip: &str, country: &str) -> ServerRecord {
        ServerRecord { country_long: country.into(), ..ServerRecord::new(host, ip) }
    }

    fn list(hosts: &str) -> Vec<ServerRecord> {
        hosts.chars().map(|c| rec(&c.to_string(), "10.0.0.1", "Japan")).collect()
    }

    fn listing(servers: &[ServerRecord]) -> Vec<(String, String, String)> {
        servers
            .iter()
            .map(|s| (s.host_name.clone(), s.ip_address.clone(), s.country_long.clone()))
            .collect()
    }

    fn assert_round_trip(old: &[ServerRecord], new: &[ServerRecord]) -> EditScript {
        let script = diff(old, new);
        let mut view = old.to_vec();
        script.apply(&mut view, new);
        assert_eq!(listing(&view), listing(new), "script {:?}", script.edits());
        script
    }

    #[test]
    fn empty_old_inserts_everything_in_order() {
        let new = list("abc");
        let script = diff(&[], &new);
        assert_eq!(
            script.edits(),
            &[
                Edit::Insert { position: 0, new_index: 0 },
                Edit::Insert { position: 1, new_index: 1 },
                Edit::Insert { position: 2, new_index: 2 },
            ]
        );
    }

    #[test]
    fn country_change_is_a_single_change() {
        let script = diff(&[rec("a", "1", "JP")], &[rec("a", "1", "US")]);
        assert_eq!(script.edits(), &[Edit::Change { position: 0, new_index: 0 }]);
    }

    #[test]
    fn untracked_fields_do_not_produce_changes() {
        let old = rec("a", "1", "JP");
        let mut new = old.clone();
        new.speed = 99;
        new.ping = "300".into();
        new.score = 7;
        assert!(diff(&[old], &[new]).is_empty());
    }

    #[test]
    fn ip_change_is_a_change() {
        let script = diff(&[rec("a", "1", "JP"), rec("b", "2", "JP")], &[rec("a", "1", "JP"), rec("b", "3", "JP")]);
        assert_eq!(script.edits(), &[Edit::Change { position: 1, new_index: 1 }]);
    }

    #[test]
    fn swap_is_one_move() {
        let script = assert_round_trip(&list("ab"), &list("ba"));
        assert_eq!(script.len(), 1);
        assert!(matches!(script.edits()[0], Edit::Move { .. }));
    }

    #[test]
    fn identical_lists_need_nothing() {
        assert!(diff(&list("abcd"), &list("abcd")).is_empty());
    }

    #[test]
    fn removals_run_back_to_front() {
        let script = assert_round_trip(&list("abcde"), &list("ace"));
        assert_eq!(
            script.edits(),
            &[Edit::Remove { position: 3 }, Edit::Remove { position: 1 }]
        );
    }

    #[test]
    fn clearing_the_list_removes_everything() {
        let script = assert_round_trip(&list("abc"), &[]);
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn round_trips() {
        let cases = [
            ("abc", "abc"),
            ("abc", "cba"),
            ("abcdef", "fedcba"),
            ("abcdef", "bdfxyz"),
            ("abc", "xaybzc"),
            ("abcde", "eabcd"),
            ("abcde", "bcdea"),
            ("a", "bcd"),
            ("abcd", "dxcybza"),
            ("aab", "baa"),
            ("abab", "bbaa"),
            ("aaa", "a"),
            ("a", "aaa"),
            ("abca", "acab"),
        ];
        for (old, new) in cases {
            assert_round_trip(&list(old), &list(new));
        }
    }

    #[test]
    fn round_trip_with_changes_and_moves() {
        let old = vec![rec("a", "1", "JP"), rec("b", "2", "JP"), rec("c", "3", "KR"), rec("d", "4", "US")];
        let new = vec![rec("d", "4", "US"), rec("e", "5", "JP"), rec("b", "9", "JP"), rec("a", "1", "TH")];
        let script = assert_round_trip(&old, &new);
        let changes = script.edits().iter().filter(|e| matches!(e, Edit::Change { .. })).count();
        assert_eq!(changes, 2);
    }

    #[test]
    fn generic_diff_over_plain_values() {
        let old = [1, 2, 3, 4];
        let new = [4, 1, 3, 5];
        let script = diff_by(&old, &new, |a, b| a == b, |a, b| a == b);
        let mut v = old.to_vec();
        script.apply(&mut v, &new);
        assert_eq!(v, new);
    }

    #[derive(Default)]
    struct Counter {
        inserted: usize,
        removed: usize,
        moved: usize,
        changed: usize,
    }

    impl ListUpdate for Counter {
        fn inserted(&mut self, _: usize, _: usize) {
            self.inserted += 1;
        }
        fn removed(&mut self, _: usize) {
            self.removed += 1;
        }
        fn moved(&mut self, _: usize, _: usize) {
            self.moved += 1;
        }
        fn changed(&mut self, _: usize, _: usize) {
            self.changed += 1;
        }
    }

    #[test]
    fn dispatch_reaches_every_callback() {
        let old = vec![rec("a", "1", "JP"), rec("b", "2", "JP"), rec("c", "3", "JP")];
        let new = vec![rec("c", "3", "JP"), rec("a", "1", "US"), rec("d", "4", "JP")];
        let mut counter = Counter::default();
        diff(&old, &new).dispatch(&mut counter);
        assert_eq!(counter.removed, 1);
        assert_eq!(counter.moved, 1);
        assert_eq!(counter.inserted, 1);
        assert_eq!(counter.changed, 1);
    }

    #[test]
    fn server_list_adopts_the_new_sequence() {
        let mut view = ServerList::default();
        let first = view.set_servers(list("ab"));
        assert_eq!(first.len(), 2);
        assert_eq!(view.servers().len(), 2);

        let second = view.set_servers(list("b"));
        assert_eq!(second.edits(), &[Edit::Remove { position: 0 }]);
        assert_eq!(listing(view.servers()), listing(&list("b")));
    }

    #[test]
    fn edits_serialize_with_an_op_tag() {
        let json = serde_json::to_string(&Edit::Move { from: 2, to: 0 }).unwrap();
        assert_eq!(json, r#"{"op":"move","from":2,"to":0}"#);
    }
}
