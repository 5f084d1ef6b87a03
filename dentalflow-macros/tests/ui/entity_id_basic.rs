use dentalflow_macros::entity_id;
use std::collections::BTreeMap;

#[entity_id]
struct ClinicId(String);

#[entity_id(debug = false)]
struct PatientRef(String);

impl std::fmt::Debug for PatientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PatientRef(..)")
    }
}

fn main() {
    let id = ClinicId::new("C1");
    assert_eq!(id.to_string(), "C1");
    assert_eq!(format!("{:?}", id), "ClinicId(\"C1\")");

    let parsed: ClinicId = "C2".parse().unwrap();
    assert!(id < parsed);

    let mut map = BTreeMap::new();
    map.insert(ClinicId::from("C3"), 1);
    assert_eq!(map.get(&ClinicId::new(String::from("C3"))), Some(&1));

    let inner: String = id.clone().into();
    assert_eq!(inner, "C1");
    assert_eq!(id.as_ref(), "C1");

    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"C1\"");

    // 手写 Debug 生效说明未自动派生
    assert_eq!(format!("{:?}", PatientRef::new("x")), "PatientRef(..)");
}
