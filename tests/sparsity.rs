use block_csr::bcsr_error::BlockCsrError;
use block_csr::debug_invariants::DebugInvariants;
use block_csr::sparsity::BlockSparsityPattern;

#[test]
fn insertion_order_and_duplicates_do_not_matter() {
    let mut a = BlockSparsityPattern::new(2, 5);
    a.add_row_entries(0, [4, 1, 1, 3]).unwrap();
    a.add(1, 0).unwrap();
    a.compress().unwrap();

    let mut b = BlockSparsityPattern::new(2, 5);
    b.add(1, 0).unwrap();
    b.add_row_entries(0, [1, 3, 4]).unwrap();
    b.add(0, 4).unwrap();
    b.compress().unwrap();

    assert_eq!(a, b);
    assert_eq!(a.columns_of(0).unwrap().collect::<Vec<_>>(), vec![1, 3, 4]);
    assert_eq!(a.row_length(0).unwrap(), 3);
    assert!(a.exists(1, 0).unwrap());
    assert!(!a.exists(1, 1).unwrap());
    assert!(a.validate_invariants().is_ok());
}

#[test]
fn lifecycle_errors() {
    let mut sp = BlockSparsityPattern::new(1, 1);
    assert!(!sp.is_compressed());
    assert_eq!(sp.n_nonzero_blocks().unwrap_err(), BlockCsrError::NotCompressed);
    sp.compress().unwrap();
    assert!(sp.is_compressed());
    assert_eq!(sp.compress().unwrap_err(), BlockCsrError::AlreadyCompressed);
    assert!(matches!(
        sp.row_length(1),
        Err(BlockCsrError::BlockOutOfRange { block: 1, n_blocks: 1 })
    ));
}

#[test]
fn display_lists_entries_per_row() {
    let mut sp = BlockSparsityPattern::new(2, 3);
    sp.add(1, 2).unwrap();
    sp.add(0, 1).unwrap();
    sp.add(1, 0).unwrap();
    assert_eq!(sp.to_string(), "[0,1]\n[1,0][1,2]\n");
    sp.compress().unwrap();
    assert_eq!(sp.to_string(), "[0,1]\n[1,0][1,2]\n");
}

#[test]
fn serde_roundtrip_compressed() {
    let mut sp = BlockSparsityPattern::new(3, 2);
    sp.add_row_entries(2, [1, 0]).unwrap();
    sp.compress().unwrap();
    let ser = serde_json::to_string(&sp).expect("serialize");
    let de: BlockSparsityPattern = serde_json::from_str(&ser).expect("deserialize");
    assert_eq!(de, sp);
    assert_eq!(de.columns_of(2).unwrap().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn deserializing_a_corrupted_pattern_fails() {
    let mut sp = BlockSparsityPattern::new(3, 2);
    sp.add_row_entries(2, [1, 0]).unwrap();
    sp.compress().unwrap();
    let mut json = serde_json::to_value(&sp).expect("serialize");

    json["columns"] = serde_json::json!([1, 0]);
    let err = serde_json::from_value::<BlockSparsityPattern>(json.clone()).unwrap_err();
    assert!(err.to_string().contains("not strictly increasing"), "{err}");

    json["columns"] = serde_json::json!([0, 7]);
    assert!(serde_json::from_value::<BlockSparsityPattern>(json.clone()).is_err());

    json["columns"] = serde_json::json!([0, 1]);
    json["row_offsets"] = serde_json::json!([0, 2, 0, 2]);
    assert!(serde_json::from_value::<BlockSparsityPattern>(json).is_err());
}
