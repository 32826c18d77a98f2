mod test_slicer_basic;
