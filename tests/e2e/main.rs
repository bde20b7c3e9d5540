#[macro_use]
mod macros;
mod runner;

render_test_cases!("tests/e2e/cases",
    test_interpolation_basic => "interpolation_basic",
    test_interpolation_escaping => "interpolation_escaping",
    test_array_index_paths => "array_index_paths",
    test_if_elseif_else => "if_elseif_else",
    test_if_bare_identifier_true => "if_bare_identifier_true",
    test_if_bare_identifier_false => "if_bare_identifier_false",
    test_foreach_list => "foreach_list",
    test_foreach_map => "foreach_map",
    test_foreach_nested => "foreach_nested",
    test_foreach_missing => "foreach_missing",
    test_for_loop => "for_loop",
    test_while_loop => "while_loop",
    test_do_while => "do_while",
    test_php_assignments => "php_assignments",
    test_string_concat => "string_concat",
    test_bool_interpolation => "bool_interpolation",
    test_case_directives => "case_directives",
    test_json_compact => "json_compact",
    test_json_pretty => "json_pretty",
    test_date_directives => "date_directives",
    test_dump_debug => "dump_debug",
    test_builtin_functions => "builtin_functions",
    test_ternary_coalesce => "ternary_coalesce",
    test_loose_comparison => "loose_comparison",
    test_literal_text_untouched => "literal_text_untouched",
    test_multiline_layout => "multiline_layout",
    test_error_loop_limit => "error_loop_limit",
    test_error_unclosed_block => "error_unclosed_block",
    test_error_iterate_scalar => "error_iterate_scalar",
    test_error_division_by_zero => "error_division_by_zero",
    test_error_unknown_function => "error_unknown_function",
);
