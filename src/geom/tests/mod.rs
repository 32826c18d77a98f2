mod test_polyline_basic;
