//! Object key conventions for the artifacts `setupCeremony` uploads.

use shared_types::ZkeyIndex;

pub fn genesis_zkey_key(circuit_prefix: &str) -> String {
    format!(
        "circuits/{circuit_prefix}/contributions/{circuit_prefix}_{}.zkey",
        ZkeyIndex::genesis()
    )
}

pub fn pot_key(pot_exponent: u32) -> String {
    format!("pot/pot_{pot_exponent}.ptau")
}

pub fn wasm_key(circuit_prefix: &str) -> String {
    format!("circuits/{circuit_prefix}/{circuit_prefix}.wasm")
}

pub fn r1cs_key(circuit_prefix: &str) -> String {
    format!("circuits/{circuit_prefix}/{circuit_prefix}.r1cs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_storage_layout_table() {
        assert_eq!(genesis_zkey_key("small"), "circuits/small/contributions/small_00000.zkey");
        assert_eq!(pot_key(12), "pot/pot_12.ptau");
        assert_eq!(wasm_key("small"), "circuits/small/small.wasm");
        assert_eq!(r1cs_key("small"), "circuits/small/small.r1cs");
    }
}
