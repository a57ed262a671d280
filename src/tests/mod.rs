mod test_compile_unit;
