use dentalflow_macros::value_object;

#[value_object]
struct ToothNumber(String);

#[value_object(debug = false)]
struct Opaque(i32);

#[value_object(default = false)]
enum Regime {
    Vat,
    Withholding,
}

#[value_object]
enum Level {
    #[default]
    Low,
    High,
}

fn main() {
    let _ = format!("{:?}", ToothNumber("15".into()));
    let a = ToothNumber::default();
    let _eq = a.clone() == ToothNumber(String::new());

    // debug = false 时只需能构造
    let _ = Opaque(1);

    // default = false 的枚举无需 #[default]
    let _ = Regime::Vat == Regime::Withholding;

    let lv: Level = Default::default();
    let json = serde_json::to_string(&lv).unwrap();
    assert_eq!(json, "\"Low\"");
}
