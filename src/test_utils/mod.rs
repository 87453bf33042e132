#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use fixtures::{
    TEST_PASSWORD, create_test_category, create_test_family, create_test_kid,
    create_test_transaction, create_test_user, get_test_connection, new_test_user, past_date,
};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_select, assert_form_submit_button_with_text, assert_hx_endpoint,
    assert_optional_form_input, must_get_form,
};
pub(crate) use html::{
    assert_valid_html, parse_html_document, parse_html_fragment, parse_table_rows, select_text,
};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok, get_header, parse_json};
