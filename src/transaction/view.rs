//! HTML rendering for the transaction list pages.

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    category::{Category, CategoryId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, EXPENSE_TEXT_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
        format_currency,
    },
    navigation::NavBar,
    transaction::{
        TransactionKind,
        query::{SortOrder, Summary, TransactionFilter, TransactionRow},
    },
    user::{User, UserID},
};

/// The max number of graphemes to display in the transaction table rows before
/// truncating and displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

/// The three transaction list pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionList {
    All,
    Expenses,
    Incomes,
}

impl TransactionList {
    pub(crate) fn endpoint(&self) -> &'static str {
        match self {
            TransactionList::All => endpoints::TRANSACTIONS_VIEW,
            TransactionList::Expenses => endpoints::EXPENSES_VIEW,
            TransactionList::Incomes => endpoints::INCOMES_VIEW,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            TransactionList::All => "Transactions",
            TransactionList::Expenses => "Expenses",
            TransactionList::Incomes => "Incomes",
        }
    }

    /// The kind of transaction the page is restricted to.
    pub(crate) fn fixed_kind(&self) -> Option<TransactionKind> {
        match self {
            TransactionList::All => None,
            TransactionList::Expenses => Some(TransactionKind::Expense),
            TransactionList::Incomes => Some(TransactionKind::Income),
        }
    }
}

pub(crate) struct TransactionsView<'a> {
    pub list: TransactionList,
    pub rows: &'a [TransactionRow],
    pub summary: Summary,
    /// The filter that produced `rows`, used to fill in the filter form.
    pub filter: &'a TransactionFilter,
    /// The member selected in the filter form, if any.
    pub member: Option<UserID>,
    pub categories: &'a [Category],
    /// The users whose transactions can be listed.
    pub members: &'a [User],
    pub current_user: UserID,
}

pub(crate) fn transactions_view(view: &TransactionsView<'_>) -> Markup {
    let nav_bar = NavBar::new(view.list.endpoint()).into_html();
    let new_transaction_url = match view.list.fixed_kind() {
        Some(kind) => format!("{}?kind={}", endpoints::NEW_TRANSACTION_VIEW, kind.as_str()),
        None => endpoints::NEW_TRANSACTION_VIEW.to_owned(),
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                div class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-xl font-bold" { (view.list.title()) }

                    a href=(new_transaction_url) class=(LINK_STYLE) { "Create Transaction" }
                }

                (list_tabs(view.list))
                (filter_form(view))
                (summary_view(&view.summary))
                (transaction_table(view.rows, view.current_user))
            }
        }
    };

    base(view.list.title(), &content)
}

fn list_tabs(active: TransactionList) -> Markup {
    html! {
        nav class="flex gap-4 text-sm" aria-label="Transaction lists"
        {
            @for list in [TransactionList::All, TransactionList::Expenses, TransactionList::Incomes] {
                @if list == active {
                    span class="font-semibold" aria-current="page" { (list.title()) }
                } @else {
                    a href=(list.endpoint()) class=(LINK_STYLE) { (list.title()) }
                }
            }
        }
    }
}

fn filter_form(view: &TransactionsView<'_>) -> Markup {
    let filter = view.filter;
    let category_kind = view.list.fixed_kind().map(|kind| kind.category_kind());
    let categories = view
        .categories
        .iter()
        .filter(|category| category_kind.is_none_or(|kind| category.kind == kind));

    html! {
        form
            method="get"
            action=(view.list.endpoint())
            class="grid grid-cols-2 lg:grid-cols-7 gap-2 items-end"
        {
            @if view.list == TransactionList::All {
                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="kind" id="kind" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "All" }
                        @for kind in [TransactionKind::Expense, TransactionKind::Income] {
                            option value=(kind.as_str()) selected[filter.kind == Some(kind)] { (kind.label()) }
                        }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for category in categories {
                        (category_option(category, filter.category_id))
                    }
                }
            }

            div
            {
                label for="date_from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="date_from"
                    id="date_from"
                    value=[filter.date_from]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date_to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="date_to"
                    id="date_to"
                    value=[filter.date_to]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if view.members.len() > 1 {
                div
                {
                    label for="member" class=(FORM_LABEL_STYLE) { "Member" }
                    select name="member" id="member" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "Everyone" }
                        @for member in view.members {
                            option value=(member.id) selected[view.member == Some(member.id)] { (member.full_name()) }
                        }
                    }
                }
            }

            div
            {
                label for="sort" class=(FORM_LABEL_STYLE) { "Sort" }
                select name="sort" id="sort" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value=(SortOrder::DateDesc.as_str()) selected[filter.sort == SortOrder::DateDesc] { "Newest first" }
                    option value=(SortOrder::DateAsc.as_str()) selected[filter.sort == SortOrder::DateAsc] { "Oldest first" }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}

fn category_option(category: &Category, selected: Option<CategoryId>) -> Markup {
    html! {
        option value=(category.id) selected[selected == Some(category.id)]
        {
            (category.name) " (" (category.kind.label()) ")"
        }
    }
}

fn summary_view(summary: &Summary) -> Markup {
    let balance_style = if summary.balance < 0.0 {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };

    html! {
        dl id="summary" class="grid grid-cols-3 gap-2 text-center"
        {
            div class="p-3 rounded bg-white dark:bg-gray-800"
            {
                dt class="text-sm" { "Income" }
                dd class=(INCOME_TEXT_STYLE) data-total="income" { (format_currency(summary.income)) }
            }
            div class="p-3 rounded bg-white dark:bg-gray-800"
            {
                dt class="text-sm" { "Expenses" }
                dd class=(EXPENSE_TEXT_STYLE) data-total="expense" { (format_currency(summary.expense)) }
            }
            div class="p-3 rounded bg-white dark:bg-gray-800"
            {
                dt class="text-sm" { "Balance" }
                dd class=(balance_style) data-total="balance" { (format_currency(summary.balance)) }
            }
        }
    }
}

fn transaction_table(rows: &[TransactionRow], current_user: UserID) -> Markup {
    html! {
        div class="overflow-x-auto rounded shadow"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Member" }
                        th scope="col" class="px-6 py-3 text-right" { "Income" }
                        th scope="col" class="px-6 py-3 text-right" { "Expense" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for row in rows {
                        (transaction_row_view(row, current_user))
                    }

                    @if rows.is_empty() {
                        tr
                        {
                            td colspan="7" data-empty-state="true" class="px-6 py-4 text-center"
                            {
                                "No transactions match these filters."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row_view(row: &TransactionRow, current_user: UserID) -> Markup {
    let transaction = &row.transaction;
    let (description, tooltip) = format_description(&transaction.description);
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{}'? This cannot be undone.",
        transaction.description
    );
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id) data-kind=(transaction.kind.as_str())
        {
            td class=(TABLE_CELL_STYLE) { time datetime=(transaction.date) { (transaction.date) } }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (description) }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category_name) = &row.category_name {
                    span class=(CATEGORY_BADGE_STYLE) { (category_name) }
                } @else {
                    span class="text-gray-400 dark:text-gray-500" { "-" }
                }
            }
            td class=(TABLE_CELL_STYLE) { (row.owner_login) }
            td class={ "px-6 py-4 text-right " (INCOME_TEXT_STYLE) }
            {
                @if let Some(income) = transaction.income() { (format_currency(income)) }
            }
            td class={ "px-6 py-4 text-right " (EXPENSE_TEXT_STYLE) }
            {
                @if let Some(expense) = transaction.expense() { (format_currency(expense)) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if transaction.user_id == current_user {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        }
    }
}

fn format_description(description: &str) -> (String, Option<&str>) {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        (description.to_owned(), None)
    } else {
        let truncated: String = description
            .graphemes(true)
            .take(MAX_DESCRIPTION_GRAPHEMES - 3)
            .collect();
        let truncated = truncated + "...";
        (truncated, Some(description))
    }
}
