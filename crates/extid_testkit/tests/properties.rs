//! Lookup properties of the identifier index.

use extid_core::{Config, IndexOutcome, ModuleGraph, Record, Scope};
use extid_testkit::prelude::*;
use proptest::prelude::*;
use std::ops::ControlFlow;

fn project() -> TestProject {
    init_tracing();
    let project = TestProject::new();
    project.add_module("base", &[]);
    project.add_module("sale", &["base"]);
    project.add_module("hr", &["base"]);
    project
}

fn cached_paths(index: &extid_core::ExternalIdIndex, id: &str) -> Vec<std::path::PathBuf> {
    let records: Vec<Record> = index
        .cache()
        .snapshot(id)
        .map(|r| r.to_vec())
        .unwrap_or_default();
    paths(&records)
}

#[test]
fn end_to_end_action_lookup() {
    let project = project();
    let index = project.open_in_memory();
    let views = project.write(
        "sale",
        "views/sale_views.xml",
        &odoo_xml(&record_xml("action_orders", "ir.actions.act_window", "Orders")),
    );
    index.index_path(&views).unwrap();

    let sale = Scope::roots([project.module_root("sale")]);
    let found = index.find_records_by_id("sale.action_orders", &sale).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "sale.action_orders");
    assert_eq!(found[0].model(), "ir.actions.act_window");
    assert_eq!(found[0].module(), "sale");
    assert_eq!(found[0].name(), "Orders");
    assert_eq!(paths(&found), vec![views.clone()]);

    project.write("sale", "views/sale_views.xml", &odoo_xml(""));
    index.index_path(&views).unwrap();
    assert!(index
        .find_records_by_id("sale.action_orders", &sale)
        .unwrap()
        .is_empty());
}

#[test]
fn unchanged_file_keeps_cache_content() {
    let project = project();
    let index = project.open_in_memory_with(Config::default().skip_unchanged(false));
    let xml = odoo_xml(&[
        record_xml("group_user", "res.groups", "User"),
        record_xml("group_system", "res.groups", "Settings"),
    ]
    .join("\n"));
    let path = project.write("base", "security/groups.xml", &xml);
    index.index_path(&path).unwrap();

    let first = index
        .find_records_by_id("base.group_user", &Scope::Everything)
        .unwrap();
    let cached = cached_paths(&index, "base.group_user");

    assert_eq!(
        index.index_path(&path).unwrap(),
        IndexOutcome::Indexed {
            records: 2,
            invalidated: 0
        }
    );
    let second = index
        .find_records_by_id("base.group_user", &Scope::Everything)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(cached_paths(&index, "base.group_user"), cached);
    assert_eq!(
        index.all_ids(&Scope::Everything).unwrap(),
        vec!["base.group_system", "base.group_user"]
    );
}

#[test]
fn unchanged_file_is_skipped_by_hash() {
    let project = project();
    let index = project.open_in_memory();
    let path = project.write("base", "data/res.groups.csv", "id,name\ngroup_user,User\n");
    assert!(matches!(
        index.index_path(&path).unwrap(),
        IndexOutcome::Indexed { records: 1, .. }
    ));
    assert_eq!(index.index_path(&path).unwrap(), IndexOutcome::Unchanged);
    assert_eq!(index.stats().snapshot().files_unchanged, 1);
}

#[test]
fn dropped_declaration_is_invalidated() {
    let project = project();
    let index = project.open_in_memory();
    let both = odoo_xml(&[
        record_xml("a", "res.groups", "A"),
        record_xml("b", "res.groups", "B"),
    ]
    .join("\n"));
    let path = project.write("base", "data/groups.xml", &both);
    index.index_path(&path).unwrap();
    assert_eq!(
        index
            .find_records_by_id("base.b", &Scope::Everything)
            .unwrap()
            .len(),
        1
    );

    project.write(
        "base",
        "data/groups.xml",
        &odoo_xml(&record_xml("a", "res.groups", "A")),
    );
    assert_eq!(
        index.index_path(&path).unwrap(),
        IndexOutcome::Indexed {
            records: 1,
            invalidated: 1
        }
    );
    assert!(index
        .find_records_by_id("base.b", &Scope::Everything)
        .unwrap()
        .is_empty());
    assert_eq!(
        paths(&index.find_records_by_id("base.a", &Scope::Everything).unwrap()),
        vec![path]
    );
}

#[test]
fn deleted_file_is_invalidated() {
    let project = project();
    let index = project.open_in_memory();
    let path = project.write("hr", "data/res.groups.csv", "id,name\ngroup_hr,HR\n");
    index.index_path(&path).unwrap();
    assert_eq!(
        index
            .find_records_by_id("hr.group_hr", &Scope::Everything)
            .unwrap()
            .len(),
        1
    );

    project.delete("hr", "data/res.groups.csv");
    assert_eq!(index.index_path(&path).unwrap(), IndexOutcome::Removed);
    assert!(index
        .find_records_by_id("hr.group_hr", &Scope::Everything)
        .unwrap()
        .is_empty());
    assert_eq!(index.file_count(), 0);
}

#[test]
fn second_lookup_is_answered_from_cache() {
    let project = project();
    let index = project.open_in_memory();
    let base = project.write(
        "base",
        "security/groups.xml",
        &odoo_xml(&record_xml("base.group_user", "res.groups", "User")),
    );
    let hr = project.write(
        "hr",
        "security/groups.xml",
        &odoo_xml(&record_xml("base.group_user", "res.groups", "Employee")),
    );
    index.index_path(&base).unwrap();
    index.index_path(&hr).unwrap();

    let sale_scope = project.registry.module_scope("sale");
    let narrow = index
        .find_records_by_id("base.group_user", &sale_scope)
        .unwrap();
    assert_eq!(paths(&narrow), vec![base.clone()]);
    let scans = index.stats().index_scans();

    let hr_scope = project.registry.module_scope("hr");
    let other = index.find_records_by_id("base.group_user", &hr_scope).unwrap();
    let wide = index
        .find_records_by_id("base.group_user", &Scope::Everything)
        .unwrap();
    assert_eq!(index.stats().index_scans(), scans);
    assert_eq!(index.stats().cache_hits(), 2);

    let mut hr_paths = paths(&other);
    hr_paths.sort();
    let mut expected = vec![base, hr];
    expected.sort();
    assert_eq!(hr_paths, expected);
    assert_eq!(wide.len(), 2);
}

#[test]
fn anchor_outside_modules_uses_project_scope() {
    let project = project();
    let index = project.open_in_memory();
    for module in ["base", "sale", "hr"] {
        let path = project.write(
            module,
            "data/res.groups.csv",
            &format!("id,name\nbase.group_user,{module}\n"),
        );
        index.index_path(&path).unwrap();
    }

    let outside = project.root().join("scripts/migrate.xml");
    let fallback = index
        .find_records_by_id_at("base.group_user", &outside)
        .unwrap();
    let project_wide = index
        .find_records_by_id("base.group_user", &project.registry.project_scope())
        .unwrap();
    assert!(fallback.len() >= project_wide.len());
    assert_eq!(fallback.len(), 3);

    let from_sale = index
        .find_records_by_id_at("base.group_user", &project.path("sale", "views/x.xml"))
        .unwrap();
    assert_eq!(from_sale.len(), 2);
}

#[test]
fn ambiguous_identifier_keeps_every_declaration() {
    let project = project();
    let index = project.open_in_memory();
    let base = project.write(
        "base",
        "data/groups.xml",
        &odoo_xml(&record_xml("base.group_user", "res.groups", "User")),
    );
    let hr = project.write("hr", "data/res.groups.csv", "id,name\nbase.group_user,User\n");
    index.index_path(&base).unwrap();
    index.index_path(&hr).unwrap();

    let found = index
        .find_records_by_id("base.group_user", &Scope::Everything)
        .unwrap();
    assert_eq!(found.len(), 2);
    let mut modules: Vec<&str> = found.iter().map(Record::module).collect();
    modules.sort_unstable();
    assert_eq!(modules, vec!["base", "hr"]);
    let mut files = paths(&found);
    files.sort();
    let mut expected = vec![base, hr];
    expected.sort();
    assert_eq!(files, expected);
}

#[test]
fn implicit_records_are_fused() {
    let project = project();
    let index = project.open_in_memory();
    project
        .catalog
        .define("sale.order", "sale", project.path("sale", "models/sale_order.py"));

    let sale = project.registry.module_scope("sale");
    let found = index.find_records_by_id("sale.model_sale_order", &sale).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].model(), "ir.model");
    assert_eq!(found[0].name(), "sale.order");
    assert!(!found[0].is_located());

    let ids = index.all_ids(&sale).unwrap();
    assert_eq!(
        ids.iter().filter(|id| *id == "sale.model_sale_order").count(),
        1
    );

    let hr = project.registry.module_scope("hr");
    assert!(index
        .find_records_by_id("sale.model_sale_order", &hr)
        .unwrap()
        .is_empty());
    assert_eq!(index.stats().snapshot().implicit_records, 1);
}

#[test]
fn shorthand_declarations_are_indexed() {
    let project = project();
    let index = project.open_in_memory();
    let path = project.write(
        "sale",
        "views/menus.xml",
        &odoo_xml(
            r#"    <menuitem id="menu_sale_root" name="Sales"/>
    <template id="portal_orders" name="Portal Orders"><t t-call="portal.layout"/></template>
    <report id="report_quotation" string="Quotation" model="sale.order"/>
    <function model="sale.order" name="_init_sequences"/>"#,
        ),
    );
    index.index_path(&path).unwrap();

    let menu = index
        .find_records_by_id("sale.menu_sale_root", &Scope::Everything)
        .unwrap();
    assert_eq!(menu[0].model(), "ir.ui.menu");
    let template = index
        .find_records_by_id("sale.portal_orders", &Scope::Everything)
        .unwrap();
    assert_eq!(template[0].model(), "ir.ui.view");
    assert_eq!(
        template[0].subtype(),
        Some(extid_core::RecordSubtype::Qweb)
    );
    assert_eq!(index.all_ids(&Scope::Everything).unwrap().len(), 3);
}

#[test]
fn consumer_can_stop_early() {
    let project = project();
    let index = project.open_in_memory();
    let path = project.write(
        "base",
        "data/res.groups.csv",
        "id,name\na,A\nb,B\nc,C\n",
    );
    index.index_path(&path).unwrap();

    let mut seen = Vec::new();
    let flow = index
        .process_all_records(&Scope::Everything, &mut |record| {
            seen.push(record.id().to_string());
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(seen, vec!["base.a", "base.b"]);

    let mut ids = Vec::new();
    let flow = index
        .process_all_ids(&Scope::Everything, &mut |id| {
            ids.push(id.to_string());
            ControlFlow::Break(())
        })
        .unwrap();
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(ids, vec!["base.a"]);
}

#[test]
fn suspended_index_fails_mid_scan() {
    let project = project();
    let index = project.open_in_memory();
    let path = project.write("base", "data/res.groups.csv", "id,name\na,A\nb,B\n");
    index.index_path(&path).unwrap();

    let result = index.process_all_records(&Scope::Everything, &mut |_| {
        index.suspend();
        ControlFlow::Continue(())
    });
    assert!(result.unwrap_err().is_unavailable());
    assert!(index.cache().is_known("base.a"));
    assert!(!index.cache().is_known("base.b"));

    index.resume();
    assert_eq!(
        index
            .find_records_by_id("base.b", &Scope::Everything)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn tree_indexing_skips_broken_files() {
    let project = project();
    let index = project.open_in_memory();
    project.write("base", "data/res.groups.csv", "id,name\ngroup_user,User\n");
    project.write(
        "sale",
        "views/sale_views.xml",
        &odoo_xml(&record_xml("action_orders", "ir.actions.act_window", "Orders")),
    );
    project.write("sale", "views/broken.xml", "<odoo><record id=\"x\"");
    project.write("sale", "models/sale_order.py", "class SaleOrder: pass\n");

    assert_eq!(index.index_tree(&project.addons()).unwrap(), 2);
    assert_eq!(
        index.all_ids(&Scope::Everything).unwrap(),
        vec!["base.group_user", "sale.action_orders"]
    );
    assert_eq!(index.stats().snapshot().errors, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn reindexing_is_idempotent(decls in declarations_strategy(8)) {
        let project = project();
        let index = project.open_in_memory_with(Config::default().skip_unchanged(false));
        let path = project.write("sale", "data/records.xml", &declarations_xml(&decls));

        index.index_path(&path).unwrap();
        let first = index.all_ids(&Scope::Everything).unwrap();
        index.index_path(&path).unwrap();
        let second = index.all_ids(&Scope::Everything).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), decls.len());
        for (local, (model, name)) in &decls {
            let found = index
                .find_records_by_id(&format!("sale.{local}"), &Scope::Everything)
                .unwrap();
            prop_assert_eq!(found.len(), 1);
            prop_assert_eq!(found[0].model(), model.as_str());
            prop_assert_eq!(found[0].name(), name.as_str());
        }
    }

    #[test]
    fn shrinking_a_file_forgets_dropped_ids(decls in declarations_strategy(8), keep in 0usize..8) {
        let project = project();
        let index = project.open_in_memory();
        let path = project.write("base", "data/res.groups.csv", &declarations_csv(&decls));
        index.index_path(&path).unwrap();
        for local in decls.keys() {
            index.find_records_by_id(&format!("base.{local}"), &Scope::Everything).unwrap();
        }

        let kept: std::collections::BTreeMap<_, _> =
            decls.iter().take(keep).map(|(k, v)| (k.clone(), v.clone())).collect();
        project.write("base", "data/res.groups.csv", &declarations_csv(&kept));
        index.index_path(&path).unwrap();

        for local in decls.keys() {
            let found = index
                .find_records_by_id(&format!("base.{local}"), &Scope::Everything)
                .unwrap();
            prop_assert_eq!(found.len(), usize::from(kept.contains_key(local)));
        }
    }
}
