//! End-to-end tests of the symbol table through its public API.

use statname::{
    StatName, StatNameLessThan, StatNameList, StatNameManagedStorage, SymbolTable,
};

#[test]
fn test_encode_decode_grows_table_by_token_count() {
    let table = SymbolTable::new();
    let mut storage = table.encode("a.b.c").unwrap();
    assert_eq!(table.to_string(storage.stat_name()), "a.b.c");
    assert_eq!(table.num_symbols(), 3);
    storage.free(&table);
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_round_trip_of_irregular_names() {
    let table = SymbolTable::new();
    for name in ["", ".", "..", "a..b", ".a.", "...rq.", "a"] {
        let managed = StatNameManagedStorage::new(name, &table).unwrap();
        assert_eq!(table.to_string(managed.stat_name()), name, "round trip of {name:?}");
    }
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_handle_equality_and_hash_are_reflexive() {
    let table = SymbolTable::new();
    let managed = StatNameManagedStorage::new("cluster.foo.upstream_rq_200", &table).unwrap();
    let name = managed.stat_name();
    assert_eq!(name, name);
    assert_eq!(name.hash(), name.hash());
}

#[test]
fn test_identical_names_compare_equal_across_encodings() {
    let table = SymbolTable::new();
    let first = StatNameManagedStorage::new("a.b", &table).unwrap();
    let second = StatNameManagedStorage::new("a.b", &table).unwrap();
    // Same live symbols, so the encoded bytes match.
    assert_eq!(first.stat_name(), second.stat_name());
    assert_eq!(first.stat_name().hash(), second.stat_name().hash());
}

#[test]
fn test_free_then_reencode_may_renumber_but_decodes_equal() {
    let table = SymbolTable::new();
    let mut anchor = table.encode("anchor").unwrap();
    let mut x = table.encode("x").unwrap();
    let baseline = table.num_symbols();
    x.free(&table);

    let mut x_again = table.encode("x").unwrap();
    assert_eq!(table.to_string(x_again.stat_name()), "x");
    assert_eq!(table.num_symbols(), baseline);

    x_again.free(&table);
    anchor.free(&table);
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_join_decodes_to_dotted_concatenation() {
    let table = SymbolTable::new();
    let ab = StatNameManagedStorage::new("a.b", &table).unwrap();
    let c = StatNameManagedStorage::new("c", &table).unwrap();

    let joined = table.join(&[ab.stat_name(), c.stat_name()]).unwrap();
    assert_eq!(table.to_string(StatName::new(&joined)), "a.b.c");
}

#[test]
fn test_joined_name_outlives_inputs_after_inc_ref() {
    let table = SymbolTable::new();
    let mut ab = table.encode("a.b").unwrap();
    let mut c = table.encode("c").unwrap();

    let joined = table.join(&[ab.stat_name(), c.stat_name()]).unwrap();
    table.inc_ref(StatName::new(&joined));

    ab.free(&table);
    c.free(&table);
    // The joined buffer holds its own counts now.
    assert_eq!(table.to_string(StatName::new(&joined)), "a.b.c");
    assert_eq!(table.num_symbols(), 3);

    table.free(StatName::new(&joined));
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_joined_name_hashes_like_spliced_payload() {
    let table = SymbolTable::new();
    let ab = StatNameManagedStorage::new("a.b", &table).unwrap();
    let c = StatNameManagedStorage::new("c", &table).unwrap();
    let abc = StatNameManagedStorage::new("a.b.c", &table).unwrap();

    let joined = table.join(&[ab.stat_name(), c.stat_name()]).unwrap();
    // Same live symbols spliced in the same order as a direct encoding.
    assert_eq!(StatName::new(&joined), abc.stat_name());
    assert_eq!(StatName::new(&joined).hash(), abc.stat_name().hash());
}

#[test]
fn test_populate_list_preserves_order() {
    let table = SymbolTable::new();
    let mut list = StatNameList::new();
    table.populate_list(&["a", "b.c", "d"], &mut list).unwrap();

    let mut decoded = Vec::new();
    list.iterate(|name| {
        decoded.push(table.to_string(name));
        true
    });
    assert_eq!(decoded, ["a", "b.c", "d"]);

    list.clear(&table);
    assert_eq!(table.num_symbols(), 0);
}

#[test]
fn test_less_than_matches_string_order() {
    let table = SymbolTable::new();
    let names = [
        "cluster.a.rq",
        "cluster.a.rq_200",
        "cluster.b",
        "listener.a",
        "a",
        "",
    ];
    let storages: Vec<_> = names
        .iter()
        .map(|name| StatNameManagedStorage::new(name, &table).unwrap())
        .collect();

    let comparator = StatNameLessThan::new(&table);
    let mut handles: Vec<StatName<'_>> = storages.iter().map(|s| s.stat_name()).collect();
    handles.sort_by(|a, b| comparator.cmp(*a, *b));

    let sorted: Vec<String> = handles.iter().map(|h| table.to_string(*h)).collect();
    let mut expected: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn test_call_with_string_view_sees_decoded_name() {
    let table = SymbolTable::new();
    let managed = StatNameManagedStorage::new("http.ingress.rq_total", &table).unwrap();
    table.call_with_string_view(managed.stat_name(), |view| {
        assert_eq!(view, "http.ingress.rq_total");
    });
}
