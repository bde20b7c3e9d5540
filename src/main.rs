#[cfg(feature = "components")]
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use templar::{CodeFragment, DataContext, Record, Templar, TemplateFunction, Value};

struct Product {
    name: String,
    price: f64,
}

impl Record for Product {
    fn type_name(&self) -> &str {
        "Product"
    }

    fn field_names(&self) -> Vec<String> {
        vec!["name".to_string(), "price".to_string()]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            "price" => Some(Value::from(self.price)),
            _ => None,
        }
    }
}

struct Money;

impl TemplateFunction for Money {
    fn name(&self) -> &str {
        "money"
    }

    fn call(&self, args: &[Value]) -> Result<Value, String> {
        let amount = args.first().and_then(Value::as_f64).unwrap_or(0.0);
        Ok(Value::from(format!("${:.2}", amount)))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Templar template engine ===\n");

    let workdir = std::env::temp_dir().join("templar-demo");
    let mut templar = Templar::builder()
        .view_path(workdir.join("views"))
        .cache_path(workdir.join("cache"))
        .components_path(workdir.join("views").join("components"))
        .max_loop_iterations(10_000)
        .function(Arc::new(Money))
        .build()?;
    templar.register_directive("money", true, |arg| {
        CodeFragment::print(&format!("money({})", arg))
    })?;

    let views = &templar.config().view_path;
    std::fs::create_dir_all(views.join("components"))?;
    std::fs::write(
        views.join("shop.tpl"),
        "<h1>%shop.title%</h1>\n\
         @if(count($products) > 0)\n\
         <ul>@foreach($products as $i => $p)<li>%p.name% @money($p.price)</li>@endforeach</ul>\n\
         @else\n\
         <p>Nothing for sale</p>\n\
         @endif\n\
         <footer>@uppercase($shop.owner) @date($opened, 'D, j M Y')</footer>\n",
    )?;
    std::fs::write(
        views.join("components").join("alert.tpl"),
        "<div class=\"alert alert-%kind%\">@slot('title'): @slot</div>",
    )?;

    let mut context = DataContext::from_json(json!({
        "shop": {"title": "Tea & Co", "owner": "mara"},
        "opened": 1_700_000_000,
    }))?;
    context.insert(
        "products",
        Value::Array(vec![
            Value::record(Product {
                name: "Sencha".to_string(),
                price: 12.5,
            }),
            Value::record(Product {
                name: "Oolong <rare>".to_string(),
                price: 31.0,
            }),
        ]),
    );

    println!("{}", templar.render("shop", &context)?);
    // second render is served from the artifact cache
    templar.render("shop", &context)?;
    println!("cache: {:?}\n", templar.cache().stats());

    #[cfg(feature = "components")]
    {
        let mut slots = BTreeMap::new();
        slots.insert("title".to_string(), "<b>Heads up</b>".to_string());
        slots.insert("default".to_string(), "Stock is low.".to_string());
        let props = DataContext::new().with("kind", "warning");
        println!("{}", templar.render_component("alert", &props, &slots)?);
    }

    Ok(())
}
