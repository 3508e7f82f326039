#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First, try to parse the module
    let mut module = match wasmlet::parse(data) {
        Ok(m) => m,
        Err(_) => return, // Invalid module, nothing to execute
    };

    // Invoke each function with zeroed arguments. Loops are not bounded, so
    // keep the libfuzzer -timeout flag set when running this target.
    for index in 0..module.functions.len() {
        let params = module.functions[index].parameter_count as usize;
        let _ = wasmlet::invoke(&mut module, index as u32, &vec![0; params]);
    }
});
